use tracing::info;

use super::{parse_structured, serialize_for_prompt, AgentCore};
use crate::error::{PipelineError, PipelineResult};
use crate::prompts::SYNTHESIS_PROMPT;
use crate::schema::{Context, DebateTrace, FinalReport, ReportPayload};

/// Stage name reported in diagnostics.
pub const SYNTHESIS_STAGE: &str = "synthesis";

/// Produces the final verdict from the complete set of debates.
#[derive(Clone)]
pub struct Synthesizer {
    core: AgentCore,
}

impl Synthesizer {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    /// Synthesize a report. The returned report is unscored.
    pub async fn synthesize(
        &self,
        context: &Context,
        debates: &[DebateTrace],
    ) -> PipelineResult<FinalReport> {
        let prompt = Self::build_prompt(context, debates);
        let raw = self.core.invoke(SYNTHESIS_STAGE, &prompt).await?;

        let payload: ReportPayload = parse_structured(&raw).map_err(|e| match e {
            PipelineError::MalformedOutput { raw_output, reason } => {
                PipelineError::Synthesis { raw_output, reason }
            }
            other => other,
        })?;

        info!(
            stage = SYNTHESIS_STAGE,
            debates = debates.len(),
            "Final report synthesized"
        );

        Ok(payload.into())
    }

    fn build_prompt(context: &Context, debates: &[DebateTrace]) -> String {
        format!(
            "{}\n\nContext:\n{}\n\nDebate Traces:\n{}",
            SYNTHESIS_PROMPT,
            serialize_for_prompt(context, "synthesis.context"),
            serialize_for_prompt(&debates, "synthesis.debates"),
        )
    }
}
