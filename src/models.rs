use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ReplyRagError;

/// Reply archetype requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyType {
    Short,
    Funny,
    Professional,
}

impl ReplyType {
    /// Draft slot this archetype is delivered in
    #[must_use]
    pub const fn slot(self) -> DraftSlot {
        match self {
            Self::Short => DraftSlot::Short,
            Self::Funny => DraftSlot::Medium,
            Self::Professional => DraftSlot::Detailed,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Funny => "funny",
            Self::Professional => "professional",
        }
    }
}

impl fmt::Display for ReplyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplyType {
    type Err = ReplyRagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "funny" => Ok(Self::Funny),
            "professional" => Ok(Self::Professional),
            other => Err(ReplyRagError::InvalidRequest(format!(
                "unknown replyType '{other}' (expected short, funny or professional)"
            ))),
        }
    }
}

/// One of the three output positions of a draft set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftSlot {
    Short,
    Medium,
    Detailed,
}

/// Incoming request for reply suggestions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub conversation_id: String,
    pub message_text: String,
    pub reply_type: Option<ReplyType>,
    /// Persona to write as; the configured default is used when absent
    pub persona_key: Option<String>,
}

impl ReplyRequest {
    pub fn new(conversation_id: impl Into<String>, message_text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message_text: message_text.into(),
            reply_type: None,
            persona_key: None,
        }
    }

    #[must_use]
    pub const fn with_reply_type(mut self, reply_type: ReplyType) -> Self {
        self.reply_type = Some(reply_type);
        self
    }

    #[must_use]
    pub fn with_persona_key(mut self, persona_key: impl Into<String>) -> Self {
        self.persona_key = Some(persona_key.into());
        self
    }

    /// Reject blank required fields before anything downstream runs
    pub fn validate(&self) -> crate::Result<()> {
        if self.conversation_id.trim().is_empty() {
            return Err(ReplyRagError::InvalidRequest(
                "conversationId is required".to_string(),
            ));
        }
        if self.message_text.trim().is_empty() {
            return Err(ReplyRagError::InvalidRequest(
                "messageText is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// A previously-sent creator response returned by memory search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedMemory {
    pub content: String,
    /// Always within [0, 1]
    pub similarity_score: f32,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RetrievedMemory {
    /// Build a memory, clamping the score into [0, 1] (NaN becomes 0)
    pub fn new(content: impl Into<String>, similarity_score: f32) -> Self {
        Self {
            content: content.into(),
            similarity_score: clamp_score(similarity_score),
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

#[must_use]
pub fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Creator voice description used to ground generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub personality: String,
    pub tone: String,
    #[serde(default)]
    pub voice_examples: Vec<String>,
    #[serde(default)]
    pub avoid_list: Vec<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// One message of conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sender_label: String,
    pub text: String,
    pub timestamp_millis: i64,
}

/// Up to three candidate replies; an empty slot means "not requested"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyDraftSet {
    pub short: String,
    pub medium: String,
    pub detailed: String,
}

impl ReplyDraftSet {
    /// Same text in every slot
    pub fn uniform(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            short: text.clone(),
            medium: text.clone(),
            detailed: text,
        }
    }

    /// Text in one slot, the others empty
    pub fn single(slot: DraftSlot, text: impl Into<String>) -> Self {
        let mut drafts = Self::default();
        *drafts.slot_mut(slot) = text.into();
        drafts
    }

    /// Populate the slots a request asked for: all three without a reply type,
    /// only the mapped slot with one
    pub fn for_request(reply_type: Option<ReplyType>, text: impl Into<String>) -> Self {
        match reply_type {
            Some(reply_type) => Self::single(reply_type.slot(), text),
            None => Self::uniform(text),
        }
    }

    #[must_use]
    pub fn slot(&self, slot: DraftSlot) -> &str {
        match slot {
            DraftSlot::Short => &self.short,
            DraftSlot::Medium => &self.medium,
            DraftSlot::Detailed => &self.detailed,
        }
    }

    fn slot_mut(&mut self, slot: DraftSlot) -> &mut String {
        match slot {
            DraftSlot::Short => &mut self.short,
            DraftSlot::Medium => &mut self.medium,
            DraftSlot::Detailed => &mut self.detailed,
        }
    }

    /// Non-empty drafts in slot order
    #[must_use]
    pub fn populated(&self) -> Vec<&str> {
        [&self.short, &self.medium, &self.detailed]
            .into_iter()
            .filter(|d| !d.is_empty())
            .map(String::as_str)
            .collect()
    }
}

/// Handle to the most recent message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub message_id: Uuid,
    pub conversation_id: String,
}

/// Draft set cached against a message; a new write replaces the old one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub conversation_id: String,
    pub message_id: Uuid,
    pub drafts: ReplyDraftSet,
    pub generated_at: DateTime<Utc>,
}

impl CacheRecord {
    #[must_use]
    pub fn new(handle: &MessageHandle, drafts: ReplyDraftSet, generated_at: DateTime<Utc>) -> Self {
        Self {
            conversation_id: handle.conversation_id.clone(),
            message_id: handle.message_id,
            drafts,
            generated_at,
        }
    }
}
