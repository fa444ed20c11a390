//! API handlers.

use std::sync::Arc;

use crate::feed::FeedIngestor;
use crate::web::middleware::JwtState;

pub mod articles;
pub mod auth;
pub mod dashboard;
pub mod feeds;

pub use articles::*;
pub use auth::*;
pub use dashboard::*;
pub use feeds::*;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ingestion pipeline; also owns the database handle.
    pub ingestor: FeedIngestor,
    /// Token verification.
    pub jwt: Arc<JwtState>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(ingestor: FeedIngestor, jwt: Arc<JwtState>) -> Self {
        Self { ingestor, jwt }
    }
}
