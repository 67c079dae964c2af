//! Reasoning stages of the analysis pipeline.
//!
//! - [`FactorExtractor`]: decomposes a context into typed factors
//! - [`SupportAgent`]: argues for one factor
//! - [`OppositionAgent`]: rebuts the support for one factor
//! - [`Synthesizer`]: turns all debates into the final report
//!
//! Each stage renders a prompt, makes exactly one provider call and parses
//! the completion with [`parse_structured`]. Stages share [`AgentCore`].

mod core;
mod factor;
mod opposition;
mod parse;
mod support;
mod synthesis;

pub use self::core::*;
pub use factor::*;
pub use opposition::*;
pub use parse::parse_structured;
pub use support::*;
pub use synthesis::*;

use tracing::warn;

use crate::error::PipelineError;

/// Serialize a value to embed in a prompt, with warning on failure.
pub(crate) fn serialize_for_prompt<T: serde::Serialize>(value: &T, context: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        warn!(
            error = %e,
            context = %context,
            "Failed to serialize value for prompt"
        );
        "{}".to_string()
    })
}

/// Re-label a parse failure as a failure of the named debate sub-stage.
pub(crate) fn debate_failure(stage: &'static str, err: PipelineError) -> PipelineError {
    match err {
        PipelineError::MalformedOutput { raw_output, reason } => PipelineError::Debate {
            stage,
            raw_output,
            reason,
        },
        other => other,
    }
}
