//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - init: Database schema initialization
//! - suggest: One-off reply suggestions
//! - serve: API server
//! - info: Configuration display

pub mod info;
pub mod init;
pub mod serve;
pub mod suggest;

// Re-export all public handlers
pub use info::*;
pub use init::*;
pub use serve::*;
pub use suggest::*;
