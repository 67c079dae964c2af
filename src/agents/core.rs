//! Infrastructure shared by all reasoning stages.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::PipelineResult;
use crate::langbase::CompletionProvider;

/// Shared handle to the completion provider.
///
/// Composed into each stage so they all issue calls, log latency and
/// surface transport failures the same way.
#[derive(Clone)]
pub struct AgentCore {
    provider: Arc<dyn CompletionProvider>,
}

impl AgentCore {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Run one completion for `stage` and return the raw text.
    pub async fn invoke(&self, stage: &'static str, prompt: &str) -> PipelineResult<String> {
        let start = Instant::now();
        let raw = self.provider.complete(prompt, None).await?;

        info!(
            stage,
            latency_ms = start.elapsed().as_millis() as u64,
            output_chars = raw.len(),
            "Stage completion received"
        );
        debug!(stage, raw_output = %raw, "Raw stage output");

        Ok(raw)
    }
}
