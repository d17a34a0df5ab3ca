//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

use crate::models::ReplyType;

#[derive(Parser)]
#[command(name = "replyrag")]
#[command(about = "ReplyRAG: reply suggestions in a creator's voice")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (default: server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable CORS
        #[arg(long)]
        cors: bool,
    },
    /// Generate reply drafts for one fan message
    Suggest {
        /// Conversation the message belongs to
        #[arg(long)]
        conversation: String,
        /// Fan message text
        #[arg(short, long)]
        message: String,
        /// Ask for a single draft of this type
        #[arg(short = 't', long = "type", value_enum)]
        reply_type: Option<ReplyTypeArg>,
        /// Persona to write as (default: pipeline.default_persona_key)
        #[arg(long)]
        persona: Option<String>,
        /// JSON seed file for the in-memory stores
        #[arg(long)]
        seed: Option<PathBuf>,
        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate and show the effective configuration
    Config {
        /// Print as TOML instead of a summary
        #[arg(long)]
        toml: bool,
    },
    /// Initialize the Postgres schema
    InitDb {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ReplyTypeArg {
    Short,
    Funny,
    Professional,
}

impl From<ReplyTypeArg> for ReplyType {
    fn from(arg: ReplyTypeArg) -> Self {
        match arg {
            ReplyTypeArg::Short => Self::Short,
            ReplyTypeArg::Funny => Self::Funny,
            ReplyTypeArg::Professional => Self::Professional,
        }
    }
}
