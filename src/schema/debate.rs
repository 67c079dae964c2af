use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::Factor;

/// One argument in favour of a factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupportArgument {
    pub claim: String,
    pub evidence: String,
    pub assumption: String,
}

/// Output of the support sub-stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupportArgumentSet {
    #[serde(default)]
    pub support_arguments: Vec<SupportArgument>,
}

/// One rebuttal of a support claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterArgument {
    pub target_claim: String,
    pub challenge: String,
    pub risk: String,
}

/// Output of the opposition sub-stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterArgumentSet {
    #[serde(default)]
    pub counter_arguments: Vec<CounterArgument>,
}

/// Both sides of the debate for one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateTrace {
    pub factor_id: String,
    pub factor: Factor,
    pub support: SupportArgumentSet,
    pub opposition: CounterArgumentSet,
}

impl SupportArgument {
    pub fn new(
        claim: impl Into<String>,
        evidence: impl Into<String>,
        assumption: impl Into<String>,
    ) -> Self {
        Self {
            claim: claim.into(),
            evidence: evidence.into(),
            assumption: assumption.into(),
        }
    }
}

impl CounterArgument {
    pub fn new(
        target_claim: impl Into<String>,
        challenge: impl Into<String>,
        risk: impl Into<String>,
    ) -> Self {
        Self {
            target_claim: target_claim.into(),
            challenge: challenge.into(),
            risk: risk.into(),
        }
    }
}

impl DebateTrace {
    /// Pair a factor with its two argument sets. The trace is keyed by the
    /// factor's own identifier.
    pub fn new(factor: Factor, support: SupportArgumentSet, opposition: CounterArgumentSet) -> Self {
        Self {
            factor_id: factor.factor_id.clone(),
            factor,
            support,
            opposition,
        }
    }

    pub fn support_count(&self) -> usize {
        self.support.support_arguments.len()
    }

    pub fn opposition_count(&self) -> usize {
        self.opposition.counter_arguments.len()
    }
}

/// Final verdict produced by the synthesis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub what_worked: String,
    pub what_failed: String,
    pub why_it_happened: String,
    pub how_to_improve: String,
    #[serde(default)]
    pub synthesis: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    confidence_score: f64,
}

/// The shape the synthesis stage accepts from the model. A confidence score
/// echoed by the model is accepted and discarded; the real one is computed
/// from the debate afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReportPayload {
    what_worked: String,
    what_failed: String,
    why_it_happened: String,
    how_to_improve: String,
    #[serde(default)]
    synthesis: String,
    #[serde(default)]
    recommendation: String,
    #[serde(default, rename = "confidence_score")]
    _model_confidence: Option<IgnoredAny>,
}

impl From<ReportPayload> for FinalReport {
    fn from(p: ReportPayload) -> Self {
        Self {
            what_worked: p.what_worked,
            what_failed: p.what_failed,
            why_it_happened: p.why_it_happened,
            how_to_improve: p.how_to_improve,
            synthesis: p.synthesis,
            recommendation: p.recommendation,
            confidence_score: 0.0,
        }
    }
}

impl FinalReport {
    pub fn new(
        what_worked: impl Into<String>,
        what_failed: impl Into<String>,
        why_it_happened: impl Into<String>,
        how_to_improve: impl Into<String>,
    ) -> Self {
        Self {
            what_worked: what_worked.into(),
            what_failed: what_failed.into(),
            why_it_happened: why_it_happened.into(),
            how_to_improve: how_to_improve.into(),
            synthesis: String::new(),
            recommendation: String::new(),
            confidence_score: 0.0,
        }
    }

    pub fn with_synthesis(mut self, synthesis: impl Into<String>) -> Self {
        self.synthesis = synthesis.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    /// Debate-derived confidence (0-100). Zero until the run is scored.
    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    /// Attach the confidence score. Only the controller calls this, once,
    /// after synthesis.
    pub(crate) fn set_confidence_score(&mut self, score: f64) {
        self.confidence_score = score;
    }
}

/// Everything a successful run returns to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub final_report: FinalReport,
    pub factors: Vec<Factor>,
    pub debate_logs: Vec<DebateTrace>,
}
