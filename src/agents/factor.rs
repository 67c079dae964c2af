use serde::Deserialize;
use std::collections::HashSet;
use tracing::info;

use super::{parse_structured, serialize_for_prompt, AgentCore};
use crate::error::{PipelineError, PipelineResult};
use crate::prompts::{CONTEXT_PLACEHOLDER, FACTOR_EXTRACTION_PROMPT};
use crate::schema::{Context, Domain, Factor};

const STAGE: &str = "factor_extraction";

/// Factor list as the model emits it, before domain classification.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FactorPayload {
    #[serde(default)]
    factors: Vec<RawFactor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFactor {
    factor_id: String,
    description: String,
    domain: String,
}

/// Decomposes a context into a non-empty list of typed factors.
#[derive(Clone)]
pub struct FactorExtractor {
    core: AgentCore,
}

impl FactorExtractor {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    /// Extract factors from `context`.
    ///
    /// Fails with [`PipelineError::Validation`] if any domain is outside the
    /// fixed enumeration, an identifier repeats, or no factors come back.
    pub async fn extract(&self, context: &Context) -> PipelineResult<Vec<Factor>> {
        let prompt = Self::build_prompt(context);
        let raw = self.core.invoke(STAGE, &prompt).await?;
        let payload: FactorPayload = parse_structured(&raw)?;

        let factors = validate_factors(payload.factors)?;

        info!(
            stage = STAGE,
            factor_count = factors.len(),
            factor_ids = ?factors.iter().map(|f| f.factor_id.as_str()).collect::<Vec<_>>(),
            "Factors extracted"
        );

        Ok(factors)
    }

    fn build_prompt(context: &Context) -> String {
        FACTOR_EXTRACTION_PROMPT.replace(
            CONTEXT_PLACEHOLDER,
            &serialize_for_prompt(context, "factor_extraction.context"),
        )
    }
}

fn validate_factors(raw: Vec<RawFactor>) -> PipelineResult<Vec<Factor>> {
    let mut seen = HashSet::new();
    let mut factors = Vec::with_capacity(raw.len());

    for entry in raw {
        let domain = Domain::parse(&entry.domain)?;
        let factor_id = entry.factor_id.trim().to_string();

        if factor_id.is_empty() {
            return Err(PipelineError::Validation {
                field: "factor_id".to_string(),
                reason: "Factor identifier cannot be empty".to_string(),
            });
        }
        if !seen.insert(factor_id.clone()) {
            return Err(PipelineError::Validation {
                field: "factor_id".to_string(),
                reason: format!("Duplicate factor identifier: {}", factor_id),
            });
        }

        factors.push(Factor::new(factor_id, entry.description, domain));
    }

    if factors.is_empty() {
        return Err(PipelineError::Validation {
            field: "factors".to_string(),
            reason: "No factors extracted".to_string(),
        });
    }

    Ok(factors)
}
