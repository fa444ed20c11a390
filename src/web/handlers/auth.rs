//! Session handlers.
//!
//! Tokens are issued by the external auth service; this API only verifies
//! them and keeps them in an http-only cookie for browser clients.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::web::dto::{ApiResponse, MeResponse, SessionRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, SESSION_COOKIE};

/// Lifetime of the session cookie.
const SESSION_MAX_AGE_DAYS: i64 = 7;

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_MAX_AGE_DAYS))
        .build()
}

/// POST /api/auth/session - Store a verified access token in the session cookie.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<SessionRequest>,
) -> Result<(CookieJar, Json<ApiResponse<MeResponse>>), ApiError> {
    let token = req.access_token.trim().to_string();
    let claims = state.jwt.verify(&token)?;

    tracing::info!(user_id = %claims.sub, "Session created");

    let response = MeResponse {
        user_id: claims.sub,
        email: claims.email,
    };
    Ok((jar.add(session_cookie(token)), Json(ApiResponse::new(response))))
}

/// POST /api/auth/logout - Clear the session cookie.
///
/// The expired cookie is sent whether or not the request carried one.
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let expired = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build();
    (jar.add(expired), StatusCode::NO_CONTENT)
}

/// GET /api/me - The authenticated user.
pub async fn me(AuthUser(claims): AuthUser) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::new(MeResponse {
        user_id: claims.sub,
        email: claims.email,
    }))
}
