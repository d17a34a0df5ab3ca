use clap::Parser;
use replyrag::cli::handle_config_command;
use replyrag::cli::handle_init_db_command;
use replyrag::cli::handle_serve_api;
use replyrag::cli::handle_suggest_command;
use replyrag::cli::print_error;
use replyrag::cli::Cli;
use replyrag::cli::Commands;
use replyrag::cli::SuggestArgs;
use replyrag::config::AppConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            print_error(&format!("Failed to load configuration: {e}"));
            return Err(e.into());
        }
    };

    // Initialize logging
    if cli.verbose {
        replyrag::logging::init_logging_with_level("debug")?;
    } else {
        replyrag::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve_api(&config, host, port, cors).await?;
        }
        Commands::Suggest {
            conversation,
            message,
            reply_type,
            persona,
            seed,
            json,
        } => {
            let args = SuggestArgs {
                conversation,
                message,
                reply_type: reply_type.map(Into::into),
                persona,
                seed,
                json,
            };
            handle_suggest_command(&config, args).await?;
        }
        Commands::Config { toml } => {
            handle_config_command(&config, toml).await?;
        }
        Commands::InitDb { force } => {
            handle_init_db_command(&config, force).await?;
        }
    }

    Ok(())
}
