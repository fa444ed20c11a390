//! Middleware for Web API.

pub mod auth;
pub mod cors;

pub use auth::{extract_token, jwt_auth, AuthUser, JwtClaims, JwtState, SESSION_COOKIE};
pub use cors::create_cors_layer;
