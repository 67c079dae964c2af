use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::types::{CreatePipeRequest, CreatePipeResponse, Message, PipeRequest, PipeResponse};
use super::CompletionProvider;
use crate::config::{LangbaseConfig, PipeConfig, RequestConfig};
use crate::error::{LangbaseError, LangbaseResult};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;

/// Client for interacting with Langbase Pipes API
#[derive(Clone)]
pub struct LangbaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    pipe_name: String,
    pipe_model: String,
    request_config: RequestConfig,
}

impl LangbaseClient {
    /// Create a new Langbase client bound to the completion pipe
    pub fn new(
        config: &LangbaseConfig,
        pipes: &PipeConfig,
        request_config: RequestConfig,
    ) -> LangbaseResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(LangbaseError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            pipe_name: pipes.completion.clone(),
            pipe_model: pipes.model.clone(),
            request_config,
        })
    }

    /// Call a Langbase pipe once. Failures are returned as-is, never retried.
    pub async fn call_pipe(&self, request: PipeRequest) -> LangbaseResult<PipeResponse> {
        let url = format!("{}/v1/pipes/run", self.base_url);
        let start = Instant::now();

        debug!(
            pipe = %request.name,
            messages = request.messages.len(),
            "Calling Langbase pipe"
        );

        match self.execute_request(&url, &request).await {
            Ok(response) => {
                info!(
                    pipe = %request.name,
                    latency_ms = start.elapsed().as_millis() as u64,
                    total_tokens = ?response
                        .raw
                        .as_ref()
                        .and_then(|r| r.usage.as_ref())
                        .and_then(|u| u.total_tokens),
                    "Langbase pipe call succeeded"
                );
                Ok(response)
            }
            Err(e) => {
                error!(
                    pipe = %request.name,
                    error = %e,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Langbase pipe call failed"
                );
                Err(e)
            }
        }
    }

    async fn execute_request(
        &self,
        url: &str,
        request: &PipeRequest,
    ) -> LangbaseResult<PipeResponse> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LangbaseError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let pipe_response: PipeResponse =
            response
                .json()
                .await
                .map_err(|e| LangbaseError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        if !pipe_response.success {
            return Err(LangbaseError::InvalidResponse {
                message: "Pipe reported success=false".to_string(),
            });
        }

        Ok(pipe_response)
    }

    fn classify_send_error(&self, e: reqwest::Error) -> LangbaseError {
        if e.is_timeout() {
            LangbaseError::Timeout {
                timeout_ms: self.request_config.timeout_ms,
            }
        } else {
            LangbaseError::Http(e)
        }
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Name of the pipe every stage runs against
    pub fn pipe_name(&self) -> &str {
        &self.pipe_name
    }

    /// Create a new pipe
    pub async fn create_pipe(
        &self,
        request: CreatePipeRequest,
    ) -> LangbaseResult<CreatePipeResponse> {
        let url = format!("{}/v1/pipes", self.base_url);

        info!(pipe = %request.name, "Creating Langbase pipe");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LangbaseError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LangbaseError::InvalidResponse {
                message: format!("Failed to parse create pipe response: {}", e),
            })
    }

    /// Ensure the completion pipe exists, creating it if needed
    pub async fn ensure_pipe(&self) -> LangbaseResult<()> {
        let request = CreatePipeRequest::new(&self.pipe_name)
            .with_description("AETHER factor debate and synthesis")
            .with_model(&self.pipe_model)
            .with_upsert(true)
            .with_json_output(true)
            .with_temperature(0.2)
            .with_messages(vec![Message::system(DEFAULT_SYSTEM_PROMPT)]);

        match self.create_pipe(request).await {
            Ok(_) => {
                info!(pipe = %self.pipe_name, "Completion pipe ready");
                Ok(())
            }
            Err(LangbaseError::Api { status: 409, .. }) => {
                info!(pipe = %self.pipe_name, "Pipe already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CompletionProvider for LangbaseClient {
    async fn complete<'a>(
        &self,
        prompt: &str,
        system: Option<&'a str>,
    ) -> LangbaseResult<String> {
        let messages = vec![
            Message::system(system.unwrap_or(DEFAULT_SYSTEM_PROMPT)),
            Message::user(prompt),
        ];
        let response = self
            .call_pipe(PipeRequest::new(&self.pipe_name, messages))
            .await?;
        Ok(response.completion)
    }
}
