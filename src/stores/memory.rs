//! In-memory stores backed by `DashMap`

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::DraftCacheStore;
use super::HistoryStore;
use super::PersonaStore;
use crate::errors::Result;
use crate::models::CacheRecord;
use crate::models::ConversationTurn;
use crate::models::MessageHandle;
use crate::models::PersonaProfile;

#[derive(Debug, Clone)]
struct StoredMessage {
    id: Uuid,
    turn: ConversationTurn,
}

/// Seed file layout: `{"personas": {key: profile}, "conversations": {id: [turn]}}`
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub personas: std::collections::HashMap<String, PersonaProfile>,
    #[serde(default)]
    pub conversations: std::collections::HashMap<String, Vec<ConversationTurn>>,
}

/// Personas, conversations and cached drafts held in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    personas: DashMap<String, PersonaProfile>,
    conversations: DashMap<String, Vec<StoredMessage>>,
    drafts: DashMap<Uuid, CacheRecord>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store preloaded from a JSON seed file
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let seed: SeedData = serde_json::from_str(&content)?;
        let store = Self::from_seed(seed);
        info!(
            "Loaded seed data from {}: {} personas, {} conversations",
            path.as_ref().display(),
            store.personas.len(),
            store.conversations.len()
        );
        Ok(store)
    }

    #[must_use]
    pub fn from_seed(seed: SeedData) -> Self {
        let store = Self::new();
        for (key, persona) in seed.personas {
            store.put_persona(key, persona);
        }
        for (conversation_id, turns) in seed.conversations {
            for turn in turns {
                store.push_turn(&conversation_id, turn);
            }
        }
        store
    }

    pub fn put_persona(&self, key: impl Into<String>, persona: PersonaProfile) {
        self.personas.insert(key.into(), persona);
    }

    /// Append a message, keeping the conversation time-ascending; returns its id
    pub fn push_turn(&self, conversation_id: &str, turn: ConversationTurn) -> Uuid {
        let id = Uuid::new_v4();
        let mut messages = self
            .conversations
            .entry(conversation_id.to_string())
            .or_default();
        messages.push(StoredMessage { id, turn });
        messages.sort_by_key(|m| m.turn.timestamp_millis);
        id
    }

    /// Drafts cached on a specific message
    #[must_use]
    pub fn drafts_for_message(&self, message_id: Uuid) -> Option<CacheRecord> {
        self.drafts.get(&message_id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl PersonaStore for InMemoryStore {
    async fn load_persona(&self, persona_key: &str) -> Result<Option<PersonaProfile>> {
        Ok(self.personas.get(persona_key).map(|p| p.value().clone()))
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn recent_turns(
        &self,
        conversation_id: &str,
        max_count: usize,
    ) -> Result<Vec<ConversationTurn>> {
        let Some(messages) = self.conversations.get(conversation_id) else {
            return Ok(Vec::new());
        };
        let skip = messages.len().saturating_sub(max_count);
        Ok(messages.iter().skip(skip).map(|m| m.turn.clone()).collect())
    }
}

#[async_trait]
impl DraftCacheStore for InMemoryStore {
    async fn latest_message(&self, conversation_id: &str) -> Result<Option<MessageHandle>> {
        Ok(self.conversations.get(conversation_id).and_then(|messages| {
            messages.last().map(|m| MessageHandle {
                message_id: m.id,
                conversation_id: conversation_id.to_string(),
            })
        }))
    }

    async fn write_drafts(&self, record: &CacheRecord) -> Result<()> {
        self.drafts.insert(record.message_id, record.clone());
        Ok(())
    }

    async fn cached_drafts(&self, conversation_id: &str) -> Result<Option<CacheRecord>> {
        let Some(handle) = self.latest_message(conversation_id).await? else {
            return Ok(None);
        };
        Ok(self.drafts_for_message(handle.message_id))
    }
}
