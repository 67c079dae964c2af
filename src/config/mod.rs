use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub langbase: LangbaseConfig,
    pub database: DatabaseConfig,
    pub session_log: SessionLogConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub pipes: PipeConfig,
    pub pipeline: PipelineConfig,
}

/// Langbase API configuration
#[derive(Debug, Clone)]
pub struct LangbaseConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Where completed and failed analysis sessions are recorded
#[derive(Debug, Clone)]
pub struct SessionLogConfig {
    pub backend: SessionLogBackend,
    /// Target file for the JSON lines backend.
    pub json_path: PathBuf,
}

/// Session log backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLogBackend {
    Sqlite,
    JsonLines,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Upper bound for a single completion call.
    pub timeout_ms: u64,
}

/// Langbase pipe name configuration
#[derive(Debug, Clone)]
pub struct PipeConfig {
    /// Pipe backing every reasoning stage.
    pub completion: String,
    /// Model the pipe is created with.
    pub model: String,
}

/// Pipeline tuning
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How many factors may be debated at once. 1 runs them in order.
    pub debate_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let langbase = LangbaseConfig {
            api_key: env::var("LANGBASE_API_KEY").map_err(|_| AppError::Config {
                message: "LANGBASE_API_KEY is required".to_string(),
            })?,
            base_url: env::var("LANGBASE_BASE_URL")
                .unwrap_or_else(|_| "https://api.langbase.com".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/aether.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let session_log = SessionLogConfig {
            backend: match env::var("SESSION_LOG_BACKEND")
                .unwrap_or_else(|_| "sqlite".to_string())
                .to_lowercase()
                .as_str()
            {
                "sqlite" => SessionLogBackend::Sqlite,
                "jsonl" | "json" => SessionLogBackend::JsonLines,
                other => {
                    return Err(AppError::Config {
                        message: format!("Unknown SESSION_LOG_BACKEND: {}", other),
                    })
                }
            },
            json_path: PathBuf::from(
                env::var("SESSION_LOG_PATH")
                    .unwrap_or_else(|_| "./logs/reasoning_logs.jsonl".to_string()),
            ),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
        };

        let pipes = PipeConfig {
            completion: env::var("PIPE_COMPLETION")
                .unwrap_or_else(|_| "aether-analysis-v1".to_string()),
            model: env::var("PIPE_MODEL").unwrap_or_else(|_| "openai:gpt-4o-mini".to_string()),
        };

        let pipeline = PipelineConfig {
            debate_concurrency: env::var("DEBATE_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(1)
                .max(1),
        };

        Ok(Config {
            langbase,
            database,
            session_log,
            logging,
            request,
            pipes,
            pipeline,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 30000 }
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            completion: "aether-analysis-v1".to_string(),
            model: "openai:gpt-4o-mini".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debate_concurrency: 1,
        }
    }
}
