//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides. Config::from_env() also loads a .env file
//! via dotenvy, so every test sets the variables it asserts on explicitly.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use aether_reasoning::config::{Config, LogFormat, SessionLogBackend};
use aether_reasoning::error::AppError;
use serial_test::serial;
use std::env;

fn with_api_key() {
    env::set_var("LANGBASE_API_KEY", "test-key");
}

#[test]
#[serial]
fn test_config_from_env_defaults() {
    with_api_key();
    for var in [
        "LANGBASE_BASE_URL",
        "REQUEST_TIMEOUT_MS",
        "PIPE_COMPLETION",
        "PIPE_MODEL",
        "SESSION_LOG_BACKEND",
        "DEBATE_CONCURRENCY",
    ] {
        env::remove_var(var);
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.langbase.api_key, "test-key");
    assert_eq!(config.langbase.base_url, "https://api.langbase.com");
    assert_eq!(config.request.timeout_ms, 30000);
    assert_eq!(config.pipes.completion, "aether-analysis-v1");
    assert_eq!(config.pipes.model, "openai:gpt-4o-mini");
    assert_eq!(config.session_log.backend, SessionLogBackend::Sqlite);
    assert_eq!(config.pipeline.debate_concurrency, 1);
}

#[test]
#[serial]
fn test_config_requires_api_key() {
    let saved = env::var("LANGBASE_API_KEY").ok();
    env::remove_var("LANGBASE_API_KEY");

    let result = Config::from_env();

    // A .env file in the working directory may supply the key again
    if env::var("LANGBASE_API_KEY").is_err() {
        assert!(matches!(result, Err(AppError::Config { .. })));
    }

    if let Some(key) = saved {
        env::set_var("LANGBASE_API_KEY", key);
    }
}

#[test]
#[serial]
fn test_config_from_env_custom_base_url() {
    with_api_key();
    env::set_var("LANGBASE_BASE_URL", "https://custom.api.com");

    let config = Config::from_env().unwrap();
    assert_eq!(config.langbase.base_url, "https://custom.api.com");

    env::remove_var("LANGBASE_BASE_URL");
}

#[test]
#[serial]
fn test_config_from_env_custom_database() {
    with_api_key();
    env::set_var("DATABASE_PATH", "/custom/path.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/path.db");
    assert_eq!(config.database.max_connections, 10);

    env::remove_var("DATABASE_PATH");
    env::remove_var("DATABASE_MAX_CONNECTIONS");
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    with_api_key();
    env::set_var("LOG_FORMAT", "JSON");
    env::set_var("LOG_LEVEL", "debug");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.level, "debug");

    env::remove_var("LOG_FORMAT");
    env::remove_var("LOG_LEVEL");
}

#[test]
#[serial]
fn test_config_from_env_request_and_pipe() {
    with_api_key();
    env::set_var("REQUEST_TIMEOUT_MS", "60000");
    env::set_var("PIPE_COMPLETION", "custom-analysis-v2");
    env::set_var("PIPE_MODEL", "anthropic:claude-sonnet");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, 60000);
    assert_eq!(config.pipes.completion, "custom-analysis-v2");
    assert_eq!(config.pipes.model, "anthropic:claude-sonnet");

    env::remove_var("REQUEST_TIMEOUT_MS");
    env::remove_var("PIPE_COMPLETION");
    env::remove_var("PIPE_MODEL");
}

#[test]
#[serial]
fn test_config_jsonl_session_log() {
    with_api_key();
    env::set_var("SESSION_LOG_BACKEND", "jsonl");
    env::set_var("SESSION_LOG_PATH", "/tmp/aether/sessions.jsonl");

    let config = Config::from_env().unwrap();
    assert_eq!(config.session_log.backend, SessionLogBackend::JsonLines);
    assert_eq!(
        config.session_log.json_path.to_str().unwrap(),
        "/tmp/aether/sessions.jsonl"
    );

    env::remove_var("SESSION_LOG_BACKEND");
    env::remove_var("SESSION_LOG_PATH");
}

#[test]
#[serial]
fn test_config_unknown_session_log_backend_fails() {
    with_api_key();
    env::set_var("SESSION_LOG_BACKEND", "postgres");

    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("SESSION_LOG_BACKEND"));

    env::remove_var("SESSION_LOG_BACKEND");
}

#[test]
#[serial]
fn test_config_debate_concurrency_is_at_least_one() {
    with_api_key();
    env::set_var("DEBATE_CONCURRENCY", "0");
    assert_eq!(Config::from_env().unwrap().pipeline.debate_concurrency, 1);

    env::set_var("DEBATE_CONCURRENCY", "4");
    assert_eq!(Config::from_env().unwrap().pipeline.debate_concurrency, 4);

    env::remove_var("DEBATE_CONCURRENCY");
}

#[test]
#[serial]
fn test_config_invalid_number_uses_default() {
    with_api_key();
    env::set_var("DATABASE_MAX_CONNECTIONS", "not-a-number");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.max_connections, 5);

    env::remove_var("DATABASE_MAX_CONNECTIONS");
}
