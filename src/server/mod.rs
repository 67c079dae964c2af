//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state management

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::config::Config;
use crate::langbase::CompletionProvider;
use crate::orchestrator::Orchestrator;
use crate::storage::SessionLog;

/// Application state shared across handlers.
pub struct AppState {
    /// Pipeline controller serving every analysis tool.
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Create new application state
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Assemble the pipeline described by `config`.
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn CompletionProvider>,
        session_log: Arc<dyn SessionLog>,
    ) -> Self {
        tracing::info!(
            pipe = %config.pipes.completion,
            debate_concurrency = config.pipeline.debate_concurrency,
            "AppState initializing"
        );

        let orchestrator = Orchestrator::new(provider, session_log)
            .with_debate_concurrency(config.pipeline.debate_concurrency);

        Self::new(orchestrator)
    }

    /// Session log the orchestrator writes to.
    pub fn session_log(&self) -> &Arc<dyn SessionLog> {
        self.orchestrator.session_log()
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
