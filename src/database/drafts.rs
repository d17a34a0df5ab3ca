use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use super::Database;
use crate::models::CacheRecord;
use crate::models::MessageHandle;
use crate::models::ReplyDraftSet;
use crate::stores::DraftCacheStore;
use crate::ReplyRagError;
use crate::Result;

#[async_trait]
impl DraftCacheStore for Database {
    async fn latest_message(&self, conversation_id: &str) -> Result<Option<MessageHandle>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r"
            SELECT id FROM messages
            WHERE conversation_id = $1
            ORDER BY sent_at_ms DESC, created_at DESC
            LIMIT 1
            ",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.map(|message_id| MessageHandle {
            message_id,
            conversation_id: conversation_id.to_string(),
        }))
    }

    async fn write_drafts(&self, record: &CacheRecord) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET reply_drafts = $2, drafts_generated_at = $3
            WHERE id = $1
            ",
        )
        .bind(record.message_id)
        .bind(Json(&record.drafts))
        .bind(record.generated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ReplyRagError::Store(format!(
                "message {} no longer exists",
                record.message_id
            )));
        }
        Ok(())
    }

    async fn cached_drafts(&self, conversation_id: &str) -> Result<Option<CacheRecord>> {
        let row = sqlx::query_as::<_, (Uuid, Option<Json<ReplyDraftSet>>, Option<DateTime<Utc>>)>(
            r"
            SELECT id, reply_drafts, drafts_generated_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY sent_at_ms DESC, created_at DESC
            LIMIT 1
            ",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some((message_id, Some(Json(drafts)), Some(generated_at))) => Some(CacheRecord {
                conversation_id: conversation_id.to_string(),
                message_id,
                drafts,
                generated_at,
            }),
            _ => None,
        })
    }
}
