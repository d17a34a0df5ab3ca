//! Minimal rewrite of a strongly-matching past reply

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::llm::prompts::ReplyPrompts;
use crate::llm::CompletionBackend;
use crate::llm::CompletionRequest;
use crate::models::PersonaProfile;
use crate::models::RetrievedMemory;

/// Adapts a retrieved memory to a new message at low temperature
pub struct MemoryAdapter {
    llm: Arc<dyn CompletionBackend>,
    temperature: f32,
    max_tokens: usize,
}

impl MemoryAdapter {
    pub fn new(llm: Arc<dyn CompletionBackend>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            llm,
            temperature,
            max_tokens,
        }
    }

    pub fn from_app_config(llm: Arc<dyn CompletionBackend>, config: &AppConfig) -> Self {
        Self::new(
            llm,
            config.generation.adaptation_temperature,
            config.generation.adaptation_max_tokens,
        )
    }

    /// Rewrite `memory` only as far as `message` requires
    ///
    /// An empty completion falls back to the memory text unchanged.
    ///
    /// # Errors
    /// Propagates completion backend failures.
    pub async fn adapt(
        &self,
        memory: &RetrievedMemory,
        message: &str,
        persona: &PersonaProfile,
    ) -> Result<String> {
        let request = CompletionRequest::new(
            adaptation_system_prompt(persona),
            ReplyPrompts::adaptation_request()
                .render_with(&[("memory", &memory.content), ("message", message)]),
            self.temperature,
        )
        .with_max_tokens(self.max_tokens);

        debug!(
            "Adapting memory (score={:.3}) via {}",
            memory.similarity_score,
            self.llm.name()
        );

        let adapted = self.llm.complete(&request).await?;
        let adapted = adapted.trim();

        if adapted.is_empty() {
            warn!("Adaptation returned empty text, reusing memory unchanged");
            return Ok(memory.content.clone());
        }

        Ok(adapted.to_string())
    }
}

fn adaptation_system_prompt(persona: &PersonaProfile) -> String {
    let tone = match (persona.tone.trim(), persona.personality.trim()) {
        ("", "") => "match the original reply".to_string(),
        (tone, "") => tone.to_string(),
        ("", personality) => personality.to_string(),
        (tone, personality) => format!("{tone}; {personality}"),
    };
    ReplyPrompts::adaptation_system().render_with(&[("creator", "the creator"), ("tone", &tone)])
}
