//! Read/write seams to the platform's data stores
//!
//! Personas and conversation history are read-only here; the draft cache is the only
//! thing this crate writes. [`crate::database::Database`] implements all three traits
//! over Postgres and [`InMemoryStore`] implements them for development and tests.

pub mod memory;

use async_trait::async_trait;

pub use memory::InMemoryStore;

use crate::errors::Result;
use crate::models::CacheRecord;
use crate::models::ConversationTurn;
use crate::models::MessageHandle;
use crate::models::PersonaProfile;

/// Profile context provider
#[async_trait]
pub trait PersonaStore: Send + Sync {
    /// `Ok(None)` when no persona exists under `persona_key`
    async fn load_persona(&self, persona_key: &str) -> Result<Option<PersonaProfile>>;
}

/// Conversation history provider
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The most recent `max_count` turns, oldest first
    async fn recent_turns(
        &self,
        conversation_id: &str,
        max_count: usize,
    ) -> Result<Vec<ConversationTurn>>;
}

/// Draft cache attached to a conversation's latest message
#[async_trait]
pub trait DraftCacheStore: Send + Sync {
    async fn latest_message(&self, conversation_id: &str) -> Result<Option<MessageHandle>>;

    /// Replace whatever drafts are cached on `record.message_id`
    async fn write_drafts(&self, record: &CacheRecord) -> Result<()>;

    /// Drafts cached on the conversation's latest message, if any
    async fn cached_drafts(&self, conversation_id: &str) -> Result<Option<CacheRecord>>;
}
