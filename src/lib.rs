//! # AETHER Reasoning
//!
//! Structured adversarial analysis of free-text reports. A report is
//! decomposed into causal factors, each factor is argued for and against by
//! independent model calls, the debates are synthesized into a final
//! verdict, and a confidence score is computed from the shape of the debate.
//!
//! ## Pipeline
//!
//! ```text
//! Context → FactorExtractor → [SupportAgent → OppositionAgent] per factor
//!         → Synthesizer → confidence_score → SessionLog
//! ```
//!
//! Every stage goes through a [`langbase::CompletionProvider`]; the
//! production provider runs a Langbase pipe over HTTP. Model output is
//! turned into typed data by [`agents::parse_structured`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use aether_reasoning::{Config, Orchestrator};
//! use aether_reasoning::langbase::LangbaseClient;
//! use aether_reasoning::schema::Context;
//! use aether_reasoning::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let log = Arc::new(SqliteStorage::new(&config.database).await?);
//!     let client = LangbaseClient::new(&config.langbase, &config.pipes, config.request.clone())?;
//!     let orchestrator = Orchestrator::new(Arc::new(client), log);
//!     let result = orchestrator.analyze(&Context::new("Sales grew 6% but churn rose")).await?;
//!     println!("{}", result.final_report.confidence_score());
//!     Ok(())
//! }
//! ```

/// Reasoning stages and structured output parsing.
pub mod agents;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Document ingestion into narrative text and metrics.
pub mod ingestion;
/// Completion provider boundary and Langbase client.
pub mod langbase;
/// Pipeline controller.
pub mod orchestrator;
/// Prompts for each reasoning stage.
pub mod prompts;
/// Paginated report rendering.
pub mod render;
/// Data model shared across stages.
pub mod schema;
/// Debate-shape confidence scoring.
pub mod scoring;
/// MCP server implementation and request handling.
pub mod server;
/// Append-only session log.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use orchestrator::Orchestrator;
pub use server::{AppState, McpServer, SharedState};
