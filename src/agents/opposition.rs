use tracing::info;

use super::{debate_failure, parse_structured, serialize_for_prompt, AgentCore};
use crate::error::PipelineResult;
use crate::prompts::OPPOSITION_PROMPT;
use crate::schema::{CounterArgumentSet, Factor, SupportArgumentSet};

/// Stage name reported in diagnostics.
pub const OPPOSITION_STAGE: &str = "opposition";

/// Rebuts the support produced for a factor.
#[derive(Clone)]
pub struct OppositionAgent {
    core: AgentCore,
}

impl OppositionAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    /// Generate counter-arguments conditioned on `support`.
    pub async fn generate(
        &self,
        factor: &Factor,
        support: &SupportArgumentSet,
    ) -> PipelineResult<CounterArgumentSet> {
        let prompt = Self::build_prompt(factor, support);
        let raw = self.core.invoke(OPPOSITION_STAGE, &prompt).await?;

        let opposition: CounterArgumentSet =
            parse_structured(&raw).map_err(|e| debate_failure(OPPOSITION_STAGE, e))?;

        info!(
            stage = OPPOSITION_STAGE,
            factor_id = %factor.factor_id,
            arguments = opposition.counter_arguments.len(),
            "Counter-arguments generated"
        );

        Ok(opposition)
    }

    fn build_prompt(factor: &Factor, support: &SupportArgumentSet) -> String {
        format!(
            "{}\n\nFactor:\n{}\n\nSupport Output:\n{}",
            OPPOSITION_PROMPT,
            serialize_for_prompt(factor, "opposition.factor"),
            serialize_for_prompt(support, "opposition.support"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::langbase::MockCompletionProvider;
    use crate::schema::{Domain, SupportArgument};
    use std::sync::Arc;

    fn factor() -> Factor {
        Factor::new("F2", "discounting", Domain::Policy)
    }

    fn support() -> SupportArgumentSet {
        SupportArgumentSet {
            support_arguments: vec![SupportArgument::new("discounts lifted volume", "e", "a")],
        }
    }

    #[tokio::test]
    async fn test_prompt_carries_support_output() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .withf(|prompt, _| prompt.contains("Support Output:") && prompt.contains("discounts lifted volume"))
            .times(1)
            .returning(|_, _| {
                Ok(r#"{"counter_arguments": [{"target_claim": "discounts lifted volume", "challenge": "seasonality", "risk": "margin erosion"}]}"#.to_string())
            });

        let agent = OppositionAgent::new(AgentCore::new(Arc::new(mock)));
        let counters = agent.generate(&factor(), &support()).await.unwrap();
        assert_eq!(counters.counter_arguments.len(), 1);
        assert_eq!(counters.counter_arguments[0].risk, "margin erosion");
    }

    #[tokio::test]
    async fn test_unknown_field_is_opposition_debate_error() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete().returning(|_, _| {
            Ok(r#"{"counter_arguments": [], "verdict": "support wins"}"#.to_string())
        });

        let agent = OppositionAgent::new(AgentCore::new(Arc::new(mock)));
        let err = agent.generate(&factor(), &support()).await.unwrap_err();
        match err {
            PipelineError::Debate { stage, reason, .. } => {
                assert_eq!(stage, "opposition");
                assert!(reason.contains("verdict"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
