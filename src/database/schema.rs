use super::Database;
use crate::Result;

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS personas (
        persona_key TEXT PRIMARY KEY,
        personality TEXT NOT NULL DEFAULT '',
        tone TEXT NOT NULL DEFAULT '',
        voice_examples JSONB NOT NULL DEFAULT '[]'::jsonb,
        avoid_list JSONB NOT NULL DEFAULT '[]'::jsonb,
        signature TEXT,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS messages (
        id UUID PRIMARY KEY,
        conversation_id TEXT NOT NULL,
        sender_label TEXT NOT NULL,
        body TEXT NOT NULL,
        sent_at_ms BIGINT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        reply_drafts JSONB,
        drafts_generated_at TIMESTAMPTZ
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_messages_conversation_sent
        ON messages (conversation_id, sent_at_ms DESC, created_at DESC)
    ",
];

impl Database {
    /// Create tables and indexes if they do not exist
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema initialized");
        Ok(())
    }

    /// Check if database schema is initialized
    /// Returns true if all required tables exist
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        for table_name in ["personas", "messages"] {
            let exists = sqlx::query_scalar::<_, bool>(
                r"
                SELECT EXISTS (
                    SELECT FROM information_schema.tables
                    WHERE table_schema = 'public'
                    AND table_name = $1
                )
                ",
            )
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

            if !exists {
                tracing::debug!("Missing required table: {}", table_name);
                return Ok(false);
            }
        }

        Ok(true)
    }
}
