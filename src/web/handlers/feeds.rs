//! Feed handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::reader::ReaderService;
use crate::web::dto::{AddFeedRequest, AddFeedResponse, ApiResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /api/feeds - Fetch a feed, store its articles and subscribe to it.
pub async fn add_feed(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<AddFeedRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AddFeedResponse>>), ApiError> {
    let service = ReaderService::new(&state.ingestor);
    let added = service.add_feed(auth.user_id(), &req.url).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(added.into()))))
}
