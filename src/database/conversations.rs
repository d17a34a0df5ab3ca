use async_trait::async_trait;

use super::Database;
use crate::models::ConversationTurn;
use crate::stores::HistoryStore;
use crate::Result;

#[async_trait]
impl HistoryStore for Database {
    async fn recent_turns(
        &self,
        conversation_id: &str,
        max_count: usize,
    ) -> Result<Vec<ConversationTurn>> {
        // Newest N, then flipped back to ascending order
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            r"
            SELECT sender_label, body, sent_at_ms FROM (
                SELECT sender_label, body, sent_at_ms, created_at
                FROM messages
                WHERE conversation_id = $1
                ORDER BY sent_at_ms DESC, created_at DESC
                LIMIT $2
            ) recent
            ORDER BY sent_at_ms ASC, created_at ASC
            ",
        )
        .bind(conversation_id)
        .bind(i64::try_from(max_count).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(sender_label, text, timestamp_millis)| ConversationTurn {
                sender_label,
                text,
                timestamp_millis,
            })
            .collect())
    }
}
