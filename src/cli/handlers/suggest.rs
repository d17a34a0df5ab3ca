//! One-off reply suggestion handler

use std::path::PathBuf;

use crate::cli::output::print_info;
use crate::cli::output::print_outcome;
use crate::models::ReplyRequest;
use crate::models::ReplyType;
use crate::reply::ReplyService;
use crate::AppConfig;
use crate::Result;

/// Arguments of `replyrag suggest`
#[derive(Debug, Clone)]
pub struct SuggestArgs {
    pub conversation: String,
    pub message: String,
    pub reply_type: Option<ReplyType>,
    pub persona: Option<String>,
    pub seed: Option<PathBuf>,
    pub json: bool,
}

/// Run one request through the pipeline and print the result
pub async fn handle_suggest_command(config: &AppConfig, args: SuggestArgs) -> Result<()> {
    let mut config = config.clone();
    if let Some(seed) = &args.seed {
        config.stores.seed_file = Some(seed.to_string_lossy().to_string());
    }

    let mut request = ReplyRequest::new(args.conversation, args.message);
    if let Some(reply_type) = args.reply_type {
        request = request.with_reply_type(reply_type);
    }
    if let Some(persona) = args.persona {
        request = request.with_persona_key(persona);
    }
    request.validate()?;

    let service = ReplyService::new(&config).await?;
    if !args.json {
        print_info(&format!(
            "Suggesting replies for conversation {}...",
            request.conversation_id
        ));
        println!();
    }

    let outcome = service.suggest(request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}
