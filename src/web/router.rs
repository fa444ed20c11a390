//! Router configuration for Web API.

use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::dto::HealthResponse;
use super::handlers::{
    add_feed, create_session, dashboard, logout, mark_read, me, save_article, unsave_article,
    AppState,
};
use super::middleware::{create_cors_layer, jwt_auth};

/// Create the main API router, including the health check.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/session", post(create_session))
        .route("/logout", post(logout));

    let article_routes = Router::new()
        .route("/:id/read", post(mark_read))
        .route("/:id/save", put(save_article).delete(unsave_article));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/me", get(me))
        .route("/dashboard", get(dashboard))
        .route("/feeds", post(add_feed))
        .nest("/articles", article_routes);

    let jwt_state = app_state.jwt.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
