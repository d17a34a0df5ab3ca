//! Postgres-backed stores
//!
//! Reads personas and conversation history, and writes the reply draft cache onto
//! the `messages` table. Schema is created by [`Database::init_schema`].

use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::Result;

mod conversations;
mod drafts;
mod personas;
mod schema;

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new database instance from configuration
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout));

        let pool = pool_options.connect(&config.url).await?;

        tracing::info!(
            "Database pool configured: max_connections={}, min_connections={}",
            config.max_connections,
            config.min_connections
        );

        Ok(Self::new(pool))
    }

    /// Get a reference to the database pool for raw queries
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}
