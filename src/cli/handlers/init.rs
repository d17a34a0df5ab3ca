//! Database initialization handlers

use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::database::Database;
use crate::errors::ReplyRagError;
use crate::AppConfig;
use crate::Result;

/// Handle database initialization command
pub async fn handle_init_db_command(config: &AppConfig, force: bool) -> Result<()> {
    let db_config = config.database.as_ref().ok_or_else(|| {
        ReplyRagError::ConfigError(
            "[database] is not configured; nothing to initialize".to_string(),
        )
    })?;

    if !force {
        print_warning("This will create the personas and messages tables if they are missing.");
        print_warning("This operation is safe - it uses CREATE IF NOT EXISTS.");
        println!("\nUse --force to proceed.");
        return Ok(());
    }

    print_info("🗄️  Initializing ReplyRAG database...");
    let database = Database::from_config(db_config).await?;

    if database.is_schema_initialized().await? {
        print_info("Schema already present, ensuring indexes");
    }
    database.init_schema().await?;

    print_success("Schema initialized");
    Ok(())
}
