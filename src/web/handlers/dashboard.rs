//! Dashboard handler.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::reader::{DashboardQuery, ReaderService, DEFAULT_DASHBOARD_LIMIT};
use crate::web::dto::{ApiResponse, DashboardParams, DashboardResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/dashboard - Subscribed feeds and their newest articles.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    let query = DashboardQuery::for_user(auth.user_id())
        .feed(params.feed_id)
        .saved_only(params.saved)
        .unread_only(params.unread)
        .limit(params.limit.unwrap_or(DEFAULT_DASHBOARD_LIMIT));

    let dashboard = ReaderService::new(&state.ingestor).dashboard(&query).await?;
    Ok(Json(ApiResponse::new(dashboard.into())))
}
