//! Fresh draft generation from persona, history and optional grounding

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use tracing::info;

use super::context::ContextAssembler;
use crate::cli::output::truncate_str;
use crate::config::AppConfig;
use crate::errors::ReplyRagError;
use crate::errors::Result;
use crate::llm::prompts::ReplyPrompts;
use crate::llm::CompletionBackend;
use crate::llm::CompletionRequest;
use crate::models::ConversationTurn;
use crate::models::PersonaProfile;
use crate::models::ReplyDraftSet;
use crate::models::ReplyType;
use crate::models::RetrievedMemory;

/// Generation knobs taken from `[generation]`
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub history_window: usize,
    pub temperature: f32,
    pub three_draft_max_tokens: usize,
    pub short_max_tokens: usize,
    pub funny_max_tokens: usize,
    pub professional_max_tokens: usize,
    pub max_context_length: usize,
}

impl GenerationSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let generation = &config.generation;
        Self {
            history_window: generation.history_window,
            temperature: generation.draft_temperature,
            three_draft_max_tokens: generation.three_draft_max_tokens,
            short_max_tokens: generation.short_max_tokens,
            funny_max_tokens: generation.funny_max_tokens,
            professional_max_tokens: generation.professional_max_tokens,
            max_context_length: generation.max_context_length,
        }
    }

    const fn max_tokens_for(&self, reply_type: ReplyType) -> usize {
        match reply_type {
            ReplyType::Short => self.short_max_tokens,
            ReplyType::Funny => self.funny_max_tokens,
            ReplyType::Professional => self.professional_max_tokens,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// Everything a generation call is grounded on
#[derive(Debug, Clone, Copy)]
pub struct GenerationInput<'a> {
    pub persona: &'a PersonaProfile,
    /// Oldest first
    pub history: &'a [ConversationTurn],
    pub message: &'a str,
    /// Empty for full generation
    pub grounding: &'a [RetrievedMemory],
}

#[derive(Debug, Deserialize)]
struct ThreeDraftPayload {
    short: String,
    medium: String,
    detailed: String,
}

/// Draft generator over a completion backend
pub struct DraftGenerator {
    llm: Arc<dyn CompletionBackend>,
    assembler: ContextAssembler,
    settings: GenerationSettings,
}

impl DraftGenerator {
    pub fn new(llm: Arc<dyn CompletionBackend>, settings: GenerationSettings) -> Self {
        Self {
            assembler: ContextAssembler::new(settings.max_context_length),
            llm,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Three drafts without a reply type, otherwise one draft in the mapped slot
    ///
    /// # Errors
    /// `LlmError` from the backend, `MalformedOutput` for unusable output.
    pub async fn generate(
        &self,
        input: &GenerationInput<'_>,
        reply_type: Option<ReplyType>,
    ) -> Result<ReplyDraftSet> {
        let system = self.system_prompt(input);
        match reply_type {
            None => self.generate_three(system, input.message).await,
            Some(reply_type) => {
                let draft = self.generate_single(system, input.message, reply_type).await?;
                Ok(ReplyDraftSet::single(reply_type.slot(), draft))
            }
        }
    }

    fn system_prompt(&self, input: &GenerationInput<'_>) -> String {
        let skip = input.history.len().saturating_sub(self.settings.history_window);
        let history = &input.history[skip..];
        debug!(
            "Building generation context: {} history turns, {} grounding memories",
            history.len(),
            input.grounding.len()
        );
        self.assembler
            .system_prompt(input.persona, history, input.grounding)
    }

    async fn generate_three(&self, system: String, message: &str) -> Result<ReplyDraftSet> {
        let request = CompletionRequest::new(
            system,
            ReplyPrompts::three_drafts().render_with(&[("message", message)]),
            self.settings.temperature,
        )
        .with_max_tokens(self.settings.three_draft_max_tokens)
        .with_structured_output();

        let raw = self.llm.complete(&request).await?;
        let drafts = parse_three_drafts(&raw)?;
        info!(
            "Generated three drafts ({}/{}/{} chars)",
            drafts.short.len(),
            drafts.medium.len(),
            drafts.detailed.len()
        );
        Ok(drafts)
    }

    async fn generate_single(
        &self,
        system: String,
        message: &str,
        reply_type: ReplyType,
    ) -> Result<String> {
        let (archetype, length_guidance) = archetype_guidance(reply_type);
        let request = CompletionRequest::new(
            system,
            ReplyPrompts::single_draft().render_with(&[
                ("message", message),
                ("archetype", archetype),
                ("length_guidance", length_guidance),
            ]),
            self.settings.temperature,
        )
        .with_max_tokens(self.settings.max_tokens_for(reply_type));

        let raw = self.llm.complete(&request).await?;
        let draft = clean_single_draft(&raw);
        if draft.is_empty() {
            return Err(ReplyRagError::MalformedOutput(format!(
                "empty {reply_type} draft"
            )));
        }
        info!("Generated {} draft ({} chars)", reply_type, draft.len());
        Ok(draft)
    }
}

const fn archetype_guidance(reply_type: ReplyType) -> (&'static str, &'static str) {
    match reply_type {
        ReplyType::Short => (
            "short and punchy",
            "Keep it to a single sentence.",
        ),
        ReplyType::Funny => (
            "funny and playful, with a light joke or some teasing that still answers the message",
            "Keep it to two or three sentences.",
        ),
        ReplyType::Professional => (
            "professional and thorough: warm, clear and complete",
            "Use four or five sentences.",
        ),
    }
}

/// Parse the three-draft JSON object; a surrounding code fence is tolerated
///
/// # Errors
/// `MalformedOutput` when the text is not the expected object or any draft is blank.
pub fn parse_three_drafts(raw: &str) -> Result<ReplyDraftSet> {
    let body = strip_code_fence(raw);
    let payload: ThreeDraftPayload = serde_json::from_str(body).map_err(|e| {
        ReplyRagError::MalformedOutput(format!(
            "expected {{short, medium, detailed}}: {e} (output: {})",
            truncate_str(raw, 120)
        ))
    })?;

    let drafts = ReplyDraftSet {
        short: payload.short.trim().to_string(),
        medium: payload.medium.trim().to_string(),
        detailed: payload.detailed.trim().to_string(),
    };

    for (name, text) in [
        ("short", &drafts.short),
        ("medium", &drafts.medium),
        ("detailed", &drafts.detailed),
    ] {
        if text.is_empty() {
            return Err(ReplyRagError::MalformedOutput(format!(
                "draft '{name}' is empty"
            )));
        }
    }

    Ok(drafts)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn clean_single_draft(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}
