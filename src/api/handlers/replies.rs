/// Reply suggestion handlers
use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;
use tracing::info;

use super::ApiError;
use super::AppState;
use crate::api::types::ApiResponse;
use crate::api::types::ReplyRequestBody;
use crate::api::types::ReplyResponse;
use crate::models::CacheRecord;

/// Generate reply drafts (POST /api/replies)
pub async fn create_replies(
    State(state): State<AppState>,
    body: Result<Json<ReplyRequestBody>, JsonRejection>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    let request = body.into_request()?;
    info!(
        "POST /api/replies: conversation={}, type={:?}",
        request.conversation_id, request.reply_type
    );

    let outcome = state.reply_service.suggest(request).await?;
    Ok(Json(ReplyResponse {
        drafts: outcome.drafts,
    }))
}

/// Read back cached drafts (GET /api/conversations/:id/drafts)
pub async fn get_cached_drafts(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<CacheRecord>>, ApiError> {
    info!("GET /api/conversations/{}/drafts", conversation_id);

    match state.draft_cache.cached_drafts(&conversation_id).await {
        Ok(Some(record)) => Ok(Json(ApiResponse::success(record))),
        Ok(None) => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("No cached drafts for conversation {conversation_id}"),
        )),
        Err(e) => {
            error!("Failed to read cached drafts for {}: {}", conversation_id, e);
            Err(e.into())
        }
    }
}
