//! Persists drafts against a conversation's latest message

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::models::CacheRecord;
use crate::models::ReplyDraftSet;
use crate::stores::DraftCacheStore;

/// What happened to the cache write; never turns a reply into a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CacheStatus {
    Written { message_id: Uuid },
    SkippedNoMessage,
    Failed { reason: String },
}

impl CacheStatus {
    #[must_use]
    pub const fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

pub struct DraftCacheWriter {
    store: Arc<dyn DraftCacheStore>,
}

impl DraftCacheWriter {
    pub fn new(store: Arc<dyn DraftCacheStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn DraftCacheStore> {
        Arc::clone(&self.store)
    }

    /// [`Self::write`] bounded by `budget`; expiry becomes [`CacheStatus::Failed`]
    pub async fn write_within(
        &self,
        conversation_id: &str,
        drafts: &ReplyDraftSet,
        budget: Duration,
    ) -> CacheStatus {
        match tokio::time::timeout(budget, self.write(conversation_id, drafts)).await {
            Ok(status) => status,
            Err(_) => {
                warn!(
                    "Caching drafts for {} timed out after {:?}",
                    conversation_id, budget
                );
                CacheStatus::Failed {
                    reason: format!("timed out after {budget:?}"),
                }
            }
        }
    }

    /// Write `drafts` onto the latest message, replacing earlier drafts there
    pub async fn write(&self, conversation_id: &str, drafts: &ReplyDraftSet) -> CacheStatus {
        let handle = match self.store.latest_message(conversation_id).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                warn!("No messages in conversation {}, drafts not cached", conversation_id);
                return CacheStatus::SkippedNoMessage;
            }
            Err(e) => {
                warn!("Failed to look up latest message of {}: {}", conversation_id, e);
                return CacheStatus::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let record = CacheRecord::new(&handle, drafts.clone(), Utc::now());
        match self.store.write_drafts(&record).await {
            Ok(()) => {
                info!(
                    "Cached drafts on message {} of conversation {}",
                    handle.message_id, conversation_id
                );
                CacheStatus::Written {
                    message_id: handle.message_id,
                }
            }
            Err(e) => {
                warn!("Failed to cache drafts on message {}: {}", handle.message_id, e);
                CacheStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
