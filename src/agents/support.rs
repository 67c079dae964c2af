use tracing::info;

use super::{debate_failure, parse_structured, serialize_for_prompt, AgentCore};
use crate::error::PipelineResult;
use crate::prompts::SUPPORT_PROMPT;
use crate::schema::{Context, Factor, SupportArgumentSet};

/// Stage name reported in diagnostics.
pub const SUPPORT_STAGE: &str = "support";

/// Argues that a factor contributed to the outcome.
#[derive(Clone)]
pub struct SupportAgent {
    core: AgentCore,
}

impl SupportAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    /// Generate supporting arguments for `factor`.
    pub async fn generate(
        &self,
        factor: &Factor,
        context: &Context,
    ) -> PipelineResult<SupportArgumentSet> {
        let prompt = Self::build_prompt(factor, context);
        let raw = self.core.invoke(SUPPORT_STAGE, &prompt).await?;

        let support: SupportArgumentSet =
            parse_structured(&raw).map_err(|e| debate_failure(SUPPORT_STAGE, e))?;

        info!(
            stage = SUPPORT_STAGE,
            factor_id = %factor.factor_id,
            arguments = support.support_arguments.len(),
            "Support arguments generated"
        );

        Ok(support)
    }

    fn build_prompt(factor: &Factor, context: &Context) -> String {
        format!(
            "{}\n\nContext:\n{}\n\nFactor:\n{}",
            SUPPORT_PROMPT,
            serialize_for_prompt(context, "support.context"),
            serialize_for_prompt(factor, "support.factor"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::langbase::MockCompletionProvider;
    use crate::schema::Domain;
    use std::sync::Arc;

    fn factor() -> Factor {
        Factor::new("F1", "churn increase", Domain::Sales)
    }

    #[tokio::test]
    async fn test_generate_parses_arguments() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .withf(|prompt, _| prompt.contains("Factor:\n{\"factor_id\":\"F1\""))
            .times(1)
            .returning(|_, _| {
                Ok(r#"Sure! {"support_arguments": [
                    {"claim": "c1", "evidence": "e1", "assumption": "a1"},
                    {"claim": "c2", "evidence": "e2", "assumption": "a2"}
                ]}"#
                .to_string())
            });

        let agent = SupportAgent::new(AgentCore::new(Arc::new(mock)));
        let support = agent.generate(&factor(), &Context::new("n")).await.unwrap();
        assert_eq!(support.support_arguments.len(), 2);
        assert_eq!(support.support_arguments[1].claim, "c2");
    }

    #[tokio::test]
    async fn test_generate_allows_empty_set() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .returning(|_, _| Ok(r#"{"support_arguments": []}"#.to_string()));

        let agent = SupportAgent::new(AgentCore::new(Arc::new(mock)));
        let support = agent.generate(&factor(), &Context::new("n")).await.unwrap();
        assert!(support.support_arguments.is_empty());
    }

    #[tokio::test]
    async fn test_parse_failure_is_debate_error_with_raw_output() {
        let mut mock = MockCompletionProvider::new();
        mock.expect_complete()
            .returning(|_, _| Ok("no arguments today".to_string()));

        let agent = SupportAgent::new(AgentCore::new(Arc::new(mock)));
        let err = agent.generate(&factor(), &Context::new("n")).await.unwrap_err();
        match err {
            PipelineError::Debate {
                stage, raw_output, ..
            } => {
                assert_eq!(stage, "support");
                assert_eq!(raw_output, "no arguments today");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_prompt_orders_context_before_factor() {
        let prompt = SupportAgent::build_prompt(&factor(), &Context::new("n"));
        let ctx = prompt.find("Context:").unwrap();
        let fac = prompt.find("Factor:").unwrap();
        assert!(ctx < fac);
    }
}
