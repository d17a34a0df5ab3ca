//! OpenAI-compatible chat completions client

use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::CompletionBackend;
use super::CompletionRequest;
use crate::cli::output::truncate_str;
use crate::config::AppConfig;
use crate::errors::ReplyRagError;
use crate::errors::Result;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion client for OpenAI-compatible endpoints
#[derive(Debug, Clone)]
pub struct LlmService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmService {
    /// Create a new LLM service from application config
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_settings(
            config.llm_endpoint(),
            config.llm_key(),
            config.llm_model(),
            Duration::from_secs(config.llm.timeout_secs),
        )
    }

    pub fn with_settings(
        endpoint: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ReplyRagError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        if self.endpoint.ends_with(CHAT_COMPLETIONS_PATH) {
            self.endpoint.clone()
        } else {
            format!("{}{}", self.endpoint, CHAT_COMPLETIONS_PATH)
        }
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &request.system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.structured.then_some(ResponseFormat {
                format_type: "json_object",
            }),
            stream: false,
        }
    }
}

#[async_trait]
impl CompletionBackend for LlmService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let started = Instant::now();
        let body = self.build_request(request);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReplyRagError::LlmError(format!("completion request timed out: {e}"))
                } else {
                    ReplyRagError::LlmError(format!("completion request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ReplyRagError::LlmError(format!(
                "completion backend returned {}: {}",
                status,
                truncate_str(&text, 200)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReplyRagError::LlmError(format!("invalid completion response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ReplyRagError::LlmError("completion response had no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        debug!(
            "Completion from {} finished in {}ms ({} chars)",
            self.model,
            started.elapsed().as_millis(),
            content.len()
        );

        Ok(content)
    }

    fn name(&self) -> &'static str {
        "openai-compatible"
    }
}
