//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::not_empty_trimmed;

/// Body of `POST /api/auth/session`.
#[derive(Debug, Deserialize, Validate)]
pub struct SessionRequest {
    /// Access token issued by the auth service.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub access_token: String,
}

/// Body of `POST /api/feeds`.
#[derive(Debug, Deserialize, Validate)]
pub struct AddFeedRequest {
    /// Feed URL.
    #[validate(url(message = "Must be a valid URL"), length(max = 2048))]
    pub url: String,
}

/// Query of `GET /api/dashboard`.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    /// Only articles of this feed.
    pub feed_id: Option<i64>,
    /// Only saved articles.
    #[serde(default)]
    pub saved: bool,
    /// Only unread articles.
    #[serde(default)]
    pub unread: bool,
    /// Maximum number of articles.
    pub limit: Option<u32>,
}
