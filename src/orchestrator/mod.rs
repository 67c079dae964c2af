//! Pipeline controller.
//!
//! Drives one analysis run through
//! `Idle → Extracting → Debating(F1..Fn) → Synthesizing → Scoring → Complete`,
//! or into `Failed` at the first error. A run either returns a complete
//! [`AnalysisResult`] or an error; partial results never escape.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agents::{AgentCore, FactorExtractor, OppositionAgent, SupportAgent, Synthesizer};
use crate::error::PipelineResult;
use crate::ingestion::{AutoExtractor, DocumentExtractor};
use crate::langbase::CompletionProvider;
use crate::render::{MarkdownRenderer, RenderedDocument, ReportRenderer};
use crate::schema::{AnalysisResult, Context, DebateTrace, Factor};
use crate::scoring::confidence_score;
use crate::storage::{SessionLog, SessionRecord};

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Extracting,
    Debating { factor_id: String },
    Synthesizing,
    Scoring,
    Complete,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Extracting => write!(f, "extracting"),
            PipelineState::Debating { factor_id } => write!(f, "debating({})", factor_id),
            PipelineState::Synthesizing => write!(f, "synthesizing"),
            PipelineState::Scoring => write!(f, "scoring"),
            PipelineState::Complete => write!(f, "complete"),
            PipelineState::Failed => write!(f, "failed"),
        }
    }
}

/// Runs the full extraction, debate, synthesis and scoring sequence.
pub struct Orchestrator {
    extractor: FactorExtractor,
    support: SupportAgent,
    opposition: OppositionAgent,
    synthesizer: Synthesizer,
    session_log: Arc<dyn SessionLog>,
    documents: Arc<dyn DocumentExtractor>,
    renderer: Arc<dyn ReportRenderer>,
    debate_concurrency: usize,
}

impl Orchestrator {
    /// Build a controller whose stages all share `provider`.
    pub fn new(provider: Arc<dyn CompletionProvider>, session_log: Arc<dyn SessionLog>) -> Self {
        let core = AgentCore::new(provider);
        Self {
            extractor: FactorExtractor::new(core.clone()),
            support: SupportAgent::new(core.clone()),
            opposition: OppositionAgent::new(core.clone()),
            synthesizer: Synthesizer::new(core),
            session_log,
            documents: Arc::new(AutoExtractor::new()),
            renderer: Arc::new(MarkdownRenderer::default()),
            debate_concurrency: 1,
        }
    }

    pub fn with_document_extractor(mut self, documents: Arc<dyn DocumentExtractor>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ReportRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Debate up to `n` factors at once. Results keep factor order.
    pub fn with_debate_concurrency(mut self, n: usize) -> Self {
        self.debate_concurrency = n.max(1);
        self
    }

    pub fn session_log(&self) -> &Arc<dyn SessionLog> {
        &self.session_log
    }

    /// Analyze a context and return the scored result.
    pub async fn analyze(&self, context: &Context) -> PipelineResult<AnalysisResult> {
        context.validate()?;

        let run_id = Uuid::new_v4();
        let start = Instant::now();
        transition(&run_id, PipelineState::Idle);

        let mut factors = Vec::new();
        match self.run(&run_id, context, &mut factors).await {
            Ok(result) => {
                transition(&run_id, PipelineState::Complete);
                info!(
                    run_id = %run_id,
                    factors = result.factors.len(),
                    confidence_score = result.final_report.confidence_score(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Analysis complete"
                );
                self.record(SessionRecord::completed(
                    context,
                    &result.factors,
                    &result.debate_logs,
                    &result.final_report,
                ))
                .await;
                Ok(result)
            }
            Err(e) => {
                transition(&run_id, PipelineState::Failed);
                error!(
                    run_id = %run_id,
                    kind = e.kind(),
                    stage = e.stage().unwrap_or("provider"),
                    error = %e,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Analysis failed"
                );
                self.record(SessionRecord::failed(context, &factors, &e)).await;
                Err(e)
            }
        }
    }

    /// Ingest a document and analyze the context built from it.
    pub async fn analyze_document(&self, bytes: &[u8]) -> PipelineResult<AnalysisResult> {
        let context = self.context_from_document(bytes).await?;
        self.analyze(&context).await
    }

    /// Analyze a context and render the result.
    pub async fn analyze_report(&self, context: &Context) -> PipelineResult<RenderedDocument> {
        let result = self.analyze(context).await?;
        Ok(self.renderer.render(&result, &context.narrative))
    }

    /// Ingest a document, analyze it and render the result.
    pub async fn analyze_document_report(&self, bytes: &[u8]) -> PipelineResult<RenderedDocument> {
        let context = self.context_from_document(bytes).await?;
        self.analyze_report(&context).await
    }

    async fn context_from_document(&self, bytes: &[u8]) -> PipelineResult<Context> {
        let document = self.documents.extract(bytes).await?;
        info!(
            chars = document.text.len(),
            metrics = document.metrics.len(),
            "Document ingested"
        );
        Ok(Context::from_document(document))
    }

    /// Stages in order. Extracted factors are written to `factors` as soon
    /// as they exist so a failed run can still record them.
    async fn run(
        &self,
        run_id: &Uuid,
        context: &Context,
        factors: &mut Vec<Factor>,
    ) -> PipelineResult<AnalysisResult> {
        transition(run_id, PipelineState::Extracting);
        factors.extend(self.extractor.extract(context).await?);

        let debate_logs = self.debate(run_id, factors, context).await?;

        transition(run_id, PipelineState::Synthesizing);
        let mut final_report = self.synthesizer.synthesize(context, &debate_logs).await?;

        transition(run_id, PipelineState::Scoring);
        final_report.set_confidence_score(confidence_score(&debate_logs));

        Ok(AnalysisResult {
            final_report,
            factors: factors.clone(),
            debate_logs,
        })
    }

    async fn debate(
        &self,
        run_id: &Uuid,
        factors: &[Factor],
        context: &Context,
    ) -> PipelineResult<Vec<DebateTrace>> {
        if self.debate_concurrency <= 1 {
            let mut traces = Vec::with_capacity(factors.len());
            for factor in factors {
                traces.push(self.debate_factor(run_id, factor, context).await?);
            }
            return Ok(traces);
        }

        stream::iter(factors.iter().map(|f| self.debate_factor(run_id, f, context)))
            .buffered(self.debate_concurrency)
            .try_collect()
            .await
    }

    async fn debate_factor(
        &self,
        run_id: &Uuid,
        factor: &Factor,
        context: &Context,
    ) -> PipelineResult<DebateTrace> {
        transition(
            run_id,
            PipelineState::Debating {
                factor_id: factor.factor_id.clone(),
            },
        );

        let support = self.support.generate(factor, context).await?;
        let opposition = self.opposition.generate(factor, &support).await?;

        Ok(DebateTrace::new(factor.clone(), support, opposition))
    }

    async fn record(&self, record: SessionRecord) {
        if let Err(e) = self.session_log.append(&record).await {
            warn!(session_id = %record.id, error = %e, "Failed to append session record");
        }
    }
}

fn transition(run_id: &Uuid, state: PipelineState) {
    debug!(run_id = %run_id, state = %state, "Pipeline state transition");
}
