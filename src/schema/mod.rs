//! Data model shared by every stage of the analysis pipeline.
//!
//! Field names match the JSON exchanged with callers, the model and the
//! session log, so these types serialize without renames.

mod debate;

pub use debate::*;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::ExtractedDocument;

/// Input record for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Main report text.
    pub narrative: String,
    #[serde(default)]
    pub extracted_facts: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
}

/// A named numeric measurement, optionally scoped to a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    pub value: f64,
}

impl Context {
    /// Create a context holding only a narrative.
    pub fn new(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            extracted_facts: Vec::new(),
            metrics: Vec::new(),
            assumptions: Vec::new(),
            limitations: Vec::new(),
        }
    }

    /// Build a context from an ingested document.
    pub fn from_document(document: ExtractedDocument) -> Self {
        Self {
            metrics: document.metrics,
            ..Self::new(document.text)
        }
    }

    pub fn with_facts(mut self, facts: Vec<String>) -> Self {
        self.extracted_facts = facts;
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_assumptions(mut self, assumptions: Vec<String>) -> Self {
        self.assumptions = assumptions;
        self
    }

    pub fn with_limitations(mut self, limitations: Vec<String>) -> Self {
        self.limitations = limitations;
        self
    }

    /// Reject input that cannot produce a meaningful analysis.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.narrative.trim().is_empty() {
            return Err(PipelineError::InvalidInput {
                field: "narrative".to_string(),
                reason: "Narrative cannot be empty".to_string(),
            });
        }

        if let Some(metric) = self.metrics.iter().find(|m| !m.value.is_finite()) {
            return Err(PipelineError::InvalidInput {
                field: "metrics".to_string(),
                reason: format!("Metric '{}' has a non-finite value", metric.name),
            });
        }

        Ok(())
    }
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            region: None,
            value,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// Domain a factor is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Sales,
    Statistics,
    Policy,
    Organization,
}

impl Domain {
    /// All domains, in display order.
    pub const ALL: [Domain; 4] = [
        Domain::Sales,
        Domain::Statistics,
        Domain::Policy,
        Domain::Organization,
    ];

    /// Normalize a raw domain label (trim + lowercase) and classify it.
    ///
    /// This is the only place raw domain strings are interpreted.
    pub fn parse(raw: &str) -> PipelineResult<Self> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| PipelineError::Validation {
                field: "domain".to_string(),
                reason: format!("Invalid domain: {}", normalized),
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Sales => "sales",
            Domain::Statistics => "statistics",
            Domain::Policy => "policy",
            Domain::Organization => "organization",
        }
    }

    /// Human-readable label used in rendered reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::Sales => "Sales",
            Domain::Statistics => "Statistics",
            Domain::Policy => "Policy",
            Domain::Organization => "Organization",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::parse(s)
    }
}

/// A discrete causal element identified in the narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    /// Identifier unique within one run, conventionally `F<n>`.
    pub factor_id: String,
    pub description: String,
    pub domain: Domain,
}

impl Factor {
    pub fn new(factor_id: impl Into<String>, description: impl Into<String>, domain: Domain) -> Self {
        Self {
            factor_id: factor_id.into(),
            description: description.into(),
            domain,
        }
    }
}
