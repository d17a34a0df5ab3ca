//! Store factory: picks Postgres or in-memory stores from configuration

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::database::Database;
use crate::stores::DraftCacheStore;
use crate::stores::HistoryStore;
use crate::stores::InMemoryStore;
use crate::stores::PersonaStore;
use crate::Result;

/// The three store seams plus a human-readable description of the backend
pub struct StoreBundle {
    pub personas: Arc<dyn PersonaStore>,
    pub history: Arc<dyn HistoryStore>,
    pub cache: Arc<dyn DraftCacheStore>,
    pub backend_info: String,
}

/// Postgres when `[database]` is configured, otherwise in-memory (seeded if
/// `stores.seed_file` is set)
///
/// # Errors
/// - Database connection errors
/// - Seed file read or parse errors
pub async fn create_stores(config: &AppConfig) -> Result<StoreBundle> {
    if let Some(db_config) = &config.database {
        let database = Arc::new(Database::from_config(db_config).await?);
        info!("🗄️  Using Postgres stores");
        return Ok(StoreBundle {
            personas: database.clone(),
            history: database.clone(),
            cache: database,
            backend_info: "postgres".to_string(),
        });
    }

    let (store, backend_info) = match &config.stores.seed_file {
        Some(path) => (
            InMemoryStore::from_seed_file(path)?,
            format!("in-memory (seeded from {path})"),
        ),
        None => (InMemoryStore::new(), "in-memory (empty)".to_string()),
    };
    info!("🧠 Using {} stores", backend_info);

    let store = Arc::new(store);
    Ok(StoreBundle {
        personas: store.clone(),
        history: store.clone(),
        cache: store,
        backend_info,
    })
}
