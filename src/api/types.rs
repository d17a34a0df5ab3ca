//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::models::ReplyDraftSet;
use crate::models::ReplyRequest;
use crate::models::ReplyType;
use crate::Result;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Reply suggestion request body
///
/// Required fields are optional here so a missing field is reported the same way as
/// a blank one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequestBody {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message_text: Option<String>,
    #[serde(default)]
    pub reply_type: Option<String>,
    #[serde(default)]
    pub persona_key: Option<String>,
}

impl ReplyRequestBody {
    /// Convert into a validated [`ReplyRequest`]
    pub fn into_request(self) -> Result<ReplyRequest> {
        let mut request = ReplyRequest::new(
            self.conversation_id.unwrap_or_default(),
            self.message_text.unwrap_or_default(),
        );
        if let Some(reply_type) = self.reply_type {
            request = request.with_reply_type(reply_type.parse::<ReplyType>()?);
        }
        if let Some(persona_key) = self.persona_key.filter(|k| !k.trim().is_empty()) {
            request = request.with_persona_key(persona_key);
        }
        request.validate()?;
        Ok(request)
    }
}

/// Reply suggestion response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub drafts: ReplyDraftSet,
}
