//! Article state handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::reader::ReaderService;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /api/articles/:id/read - Mark an article as read.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(article_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    ReaderService::new(&state.ingestor)
        .mark_read(auth.user_id(), article_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/articles/:id/save - Save an article.
pub async fn save_article(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(article_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    set_saved(&state, &auth, article_id, true).await
}

/// DELETE /api/articles/:id/save - Unsave an article.
pub async fn unsave_article(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(article_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    set_saved(&state, &auth, article_id, false).await
}

async fn set_saved(
    state: &AppState,
    auth: &AuthUser,
    article_id: i64,
    saved: bool,
) -> Result<StatusCode, ApiError> {
    ReaderService::new(&state.ingestor)
        .set_saved(auth.user_id(), article_id, saved)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
