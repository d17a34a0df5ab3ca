use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplyRagError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Persona not found: {0}")]
    PersonaNotFound(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Malformed LLM output: {0}")]
    MalformedOutput(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Reply pipeline exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure class, used by callers to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller sent something unusable; nothing downstream was called
    Client,
    /// Required data (the persona) does not exist
    NotFound,
    /// A dependency or this service failed
    Internal,
    /// The pipeline deadline expired
    Timeout,
}

impl ReplyRagError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest(_) => ErrorCategory::Client,
            Self::PersonaNotFound(_) => ErrorCategory::NotFound,
            Self::DeadlineExceeded(_) => ErrorCategory::Timeout,
            _ => ErrorCategory::Internal,
        }
    }

    /// True for errors raised by the completion backend or its output
    #[must_use]
    pub const fn is_generation_failure(&self) -> bool {
        matches!(self, Self::LlmError(_) | Self::MalformedOutput(_))
    }
}

pub type Result<T> = std::result::Result<T, ReplyRagError>;
