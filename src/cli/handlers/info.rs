//! Information display handlers

use crate::cli::output::print_config;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::AppConfig;
use crate::Result;

/// Validate and show the effective configuration
pub async fn handle_config_command(config: &AppConfig, as_toml: bool) -> Result<()> {
    config.validate()?;

    if as_toml {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    print_config(config);
    println!();
    if !config.retrieval_configured() {
        print_warning("Memory search is not configured: every request will use full generation");
    }
    print_success("Configuration is valid");
    Ok(())
}
