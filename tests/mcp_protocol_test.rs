//! Integration tests for MCP protocol handling
//!
//! Drives McpServer::serve with in-memory line-delimited input and checks
//! the JSON-RPC responses it writes.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use aether_reasoning::error::LangbaseResult;
use aether_reasoning::langbase::CompletionProvider;
use aether_reasoning::orchestrator::Orchestrator;
use aether_reasoning::prompts::{OPPOSITION_PROMPT, SUPPORT_PROMPT, SYNTHESIS_PROMPT};
use aether_reasoning::server::{AppState, McpServer, INVALID_PARAMS, STAGE_FAILED};
use aether_reasoning::storage::SqliteStorage;

/// Provider answering every stage with canned output.
struct CannedProvider {
    synthesis: &'static str,
}

#[async_trait]
impl CompletionProvider for CannedProvider {
    async fn complete<'a>(&self, prompt: &str, _system: Option<&'a str>) -> LangbaseResult<String> {
        let out = if prompt.starts_with(SUPPORT_PROMPT) {
            r#"{"support_arguments": [{"claim": "c", "evidence": "e", "assumption": "a"}, {"claim": "d", "evidence": "e", "assumption": "a"}]}"#
        } else if prompt.starts_with(OPPOSITION_PROMPT) {
            r#"{"counter_arguments": [{"target_claim": "c", "challenge": "x", "risk": "r"}, {"target_claim": "d", "challenge": "x", "risk": "r"}]}"#
        } else if prompt.starts_with(SYNTHESIS_PROMPT) {
            self.synthesis
        } else {
            r#"{"factors": [{"factor_id": "F1", "description": "Churn rose", "domain": "sales"}]}"#
        };
        Ok(out.to_string())
    }
}

const GOOD_REPORT: &str = r#"{"what_worked": "growth", "what_failed": "churn", "why_it_happened": "price", "how_to_improve": "loyalty"}"#;

async fn server_with(synthesis: &'static str) -> McpServer {
    let log = Arc::new(SqliteStorage::new_in_memory().await.unwrap());
    let orchestrator = Orchestrator::new(Arc::new(CannedProvider { synthesis }), log);
    McpServer::new(Arc::new(AppState::new(orchestrator)))
}

/// Feed request lines to the server and collect one parsed response per line written.
async fn exchange(server: &McpServer, requests: &[Value]) -> Vec<Value> {
    let input: String = requests.iter().map(|r| format!("{}\n", r)).collect();
    let mut output = Vec::new();

    server
        .serve(input.as_bytes(), &mut output)
        .await
        .expect("serve failed");

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).expect("Failed to parse JSON-RPC response"))
        .collect()
}

fn tool_call(id: u64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
}

/// Verify JSON-RPC 2.0 response structure
fn assert_valid_jsonrpc_response(response: &Value) {
    assert_eq!(response["jsonrpc"], "2.0", "Invalid JSON-RPC version");
    assert!(
        response.get("result").is_some() != response.get("error").is_some(),
        "Response must have exactly one of result or error"
    );
}

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let server = server_with(GOOD_REPORT).await;
        let responses = exchange(
            &server,
            &[
                json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
                json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            ],
        )
        .await;

        // The notification gets no response
        assert_eq!(responses.len(), 2);
        responses.iter().for_each(assert_valid_jsonrpc_response);

        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "aether-reasoning");
        let tools = responses[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 5);
        assert_eq!(tools[0]["name"], "aether_analyze");
    }

    #[tokio::test]
    async fn test_malformed_line_is_parse_error() {
        let server = server_with(GOOD_REPORT).await;
        let mut output = Vec::new();
        server
            .serve(&b"{not json\n"[..], &mut output)
            .await
            .unwrap();

        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["error"]["code"], -32700);
        assert_eq!(response["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server_with(GOOD_REPORT).await;
        let responses = exchange(
            &server,
            &[json!({"jsonrpc": "2.0", "id": 9, "method": "resources/list"})],
        )
        .await;
        assert_eq!(responses[0]["error"]["code"], -32601);
    }
}

#[cfg(test)]
mod tool_tests {
    use super::*;

    #[tokio::test]
    async fn test_analyze_returns_scored_result() {
        let server = server_with(GOOD_REPORT).await;
        let responses = exchange(
            &server,
            &[tool_call(
                1,
                "aether_analyze",
                json!({"narrative": "Sales grew 6% but churn rose"}),
            )],
        )
        .await;

        assert_valid_jsonrpc_response(&responses[0]);
        let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
        let result: Value = serde_json::from_str(text).unwrap();
        assert_eq!(result["final_report"]["confidence_score"], 83.3);
        assert_eq!(result["debate_logs"].as_array().unwrap().len(), 1);
        assert_eq!(result["factors"][0]["domain"], "sales");
    }

    #[tokio::test]
    async fn test_empty_narrative_is_invalid_params() {
        let server = server_with(GOOD_REPORT).await;
        let responses = exchange(
            &server,
            &[tool_call(2, "aether_analyze", json!({"narrative": "  "}))],
        )
        .await;

        assert_eq!(responses[0]["error"]["code"], INVALID_PARAMS);
        assert!(responses[0]["error"].get("data").is_none());
    }

    #[tokio::test]
    async fn test_stage_failure_carries_diagnostic() {
        let server = server_with("The report is fine.").await;
        let responses = exchange(
            &server,
            &[tool_call(3, "aether_analyze", json!({"narrative": "n"}))],
        )
        .await;

        let error = &responses[0]["error"];
        assert_eq!(error["code"], STAGE_FAILED);
        assert_eq!(error["data"]["stage"], "synthesis");
        assert_eq!(error["data"]["kind"], "synthesis_error");
        assert_eq!(error["data"]["raw_output"], "The report is fine.");
    }

    #[tokio::test]
    async fn test_document_report_from_inline_text() {
        let server = server_with(GOOD_REPORT).await;
        let responses = exchange(
            &server,
            &[tool_call(
                4,
                "aether_analyze_document_report",
                json!({"text": "Quarterly sales grew.\n\nRegion\tRevenue\nNorth\t120\n"}),
            )],
        )
        .await;

        let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
        let document: Value = serde_json::from_str(text).unwrap();
        assert_eq!(document["media_type"], "text/markdown");
        let first_page = document["pages"][0].as_str().unwrap();
        assert!(first_page.contains("### F1 (Sales)"));
    }

    #[tokio::test]
    async fn test_session_history_lists_runs() {
        let server = server_with(GOOD_REPORT).await;
        let responses = exchange(
            &server,
            &[
                tool_call(1, "aether_analyze", json!({"narrative": "first"})),
                tool_call(2, "aether_analyze", json!({"narrative": "second"})),
                tool_call(3, "aether_session_history", json!({"limit": 1})),
            ],
        )
        .await;

        let text = responses[2]["result"]["content"][0]["text"].as_str().unwrap();
        let history: Value = serde_json::from_str(text).unwrap();
        assert_eq!(history["total"], 2);
        assert_eq!(history["sessions"].as_array().unwrap().len(), 1);
        assert_eq!(history["sessions"][0]["input_context"]["narrative"], "second");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let server = server_with(GOOD_REPORT).await;
        let responses = exchange(&server, &[tool_call(5, "reasoning_linear", json!({}))]).await;
        assert_eq!(responses[0]["error"]["code"], INVALID_PARAMS);
    }
}
