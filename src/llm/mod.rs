//! Text completion backend
//!
//! The reply pipeline only sees the [`CompletionBackend`] trait: a system prompt and a
//! user prompt go in, text comes out. [`LlmService`] is the production implementation
//! speaking the OpenAI-compatible chat completions protocol (OpenAI, Ollama, vLLM, ...).

mod client;
pub mod prompts;

use async_trait::async_trait;

pub use client::LlmService;

use crate::errors::Result;

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    /// Soft output ceiling; backend default when `None`
    pub max_tokens: Option<usize>,
    /// Ask the backend for a JSON object response
    pub structured: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature,
            max_tokens: None,
            structured: false,
        }
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub const fn with_structured_output(mut self) -> Self {
        self.structured = true;
        self
    }
}

/// Prompt-in, text-out completion service
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion
    ///
    /// # Errors
    /// `LlmError` for transport failures, non-success statuses and empty choice lists.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}
