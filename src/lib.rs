//! ReplyRAG: reply suggestions for creator-fan messaging
//!
//! A fan message is matched against replies the creator already sent. Strong matches
//! are reused or lightly adapted; weaker ones ground freshly generated drafts in the
//! creator's persona. The resulting drafts are cached on the conversation's latest
//! message.

pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod models;
pub mod reply;
pub mod stores;


pub use config::AppConfig;
pub use errors::*;
pub use reply::ReplyService;
