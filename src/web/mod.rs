//! JSON API for the reader.
//!
//! Authentication is delegated to an external service; requests carry its
//! HS256 access token as a bearer header or in the session cookie.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
