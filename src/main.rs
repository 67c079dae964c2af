use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aether_reasoning::{
    config::{Config, LogFormat},
    langbase::LangbaseClient,
    render::RenderedDocument,
    schema::Context,
    server::{AppState, McpServer},
    storage::open_session_log,
};

#[derive(Debug, Parser)]
#[command(name = "aether", version, about = "Adversarial factor analysis of reports")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve MCP requests over stdio (default)
    Serve,
    /// Analyze a single input and print the result
    Analyze {
        /// Context JSON file, or a document with --document
        file: PathBuf,
        /// Treat FILE as a document to ingest instead of context JSON
        #[arg(long)]
        document: bool,
        /// Write a rendered report to this path
        #[arg(long, value_name = "OUT")]
        report: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "AETHER reasoning starting..."
    );

    // Initialize session log
    let session_log = match open_session_log(&config).await {
        Ok(log) => {
            info!(backend = ?config.session_log.backend, "Session log initialized");
            log
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize session log");
            return Err(e.into());
        }
    };

    // Initialize Langbase client
    let langbase = match LangbaseClient::new(&config.langbase, &config.pipes, config.request.clone())
    {
        Ok(c) => {
            info!(base_url = %config.langbase.base_url, "Langbase client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize Langbase client");
            return Err(e.into());
        }
    };

    // Ensure the completion pipe exists (create if needed)
    if let Err(e) = langbase.ensure_pipe().await {
        error!(error = %e, "Failed to ensure completion pipe exists");
        return Err(e.into());
    }

    let state = Arc::new(AppState::from_config(
        &config,
        Arc::new(langbase),
        session_log,
    ));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server = McpServer::new(state);
            info!("Server ready, waiting for requests on stdin...");

            if let Err(e) = server.run().await {
                error!(error = %e, "Server error");
                return Err(e.into());
            }

            info!("Server shutdown complete");
        }
        Command::Analyze {
            file,
            document,
            report,
        } => {
            run_analyze(&state, file, document, report).await?;
        }
    }

    Ok(())
}

/// One-shot analysis from the command line.
async fn run_analyze(
    state: &AppState,
    file: PathBuf,
    document: bool,
    report: Option<PathBuf>,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let orchestrator = &state.orchestrator;

    if document {
        return match report {
            Some(out) => {
                let rendered = orchestrator.analyze_document_report(&bytes).await?;
                write_report(&rendered, &out).await
            }
            None => print_json(&orchestrator.analyze_document(&bytes).await?),
        };
    }

    let context: Context = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a valid context JSON file", file.display()))?;

    match report {
        Some(out) => write_report(&orchestrator.analyze_report(&context).await?, &out).await,
        None => print_json(&orchestrator.analyze(&context).await?),
    }
}

async fn write_report(rendered: &RenderedDocument, out: &Path) -> anyhow::Result<()> {
    tokio::fs::write(out, rendered.to_text())
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!(path = %out.display(), pages = rendered.page_count(), "Report written");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
