/// API request handlers
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;

use crate::api::types::ApiResponse;
use crate::api::types::HealthResponse;
use crate::errors::ErrorCategory;
use crate::errors::ReplyRagError;
use crate::reply::ReplyService;
use crate::stores::DraftCacheStore;

pub mod replies;

pub use replies::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub reply_service: Arc<ReplyService>,
    pub draft_cache: Arc<dyn DraftCacheStore>,
}

impl AppState {
    pub fn new(reply_service: Arc<ReplyService>) -> Self {
        let draft_cache = reply_service.draft_cache();
        Self {
            reply_service,
            draft_cache,
        }
    }
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Error response carrying the status picked from the error category
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ReplyRagError> for ApiError {
    fn from(err: ReplyRagError) -> Self {
        let status = match err.category() {
            ErrorCategory::Client => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}
