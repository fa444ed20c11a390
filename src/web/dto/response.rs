//! Response DTOs for Web API.

use serde::Serialize;

use crate::feed::Feed;
use crate::reader::{AddedFeed, Dashboard, DashboardArticle};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// The authenticated user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// User ID (`sub` claim).
    pub user_id: String,
    /// Email, when the token carries one.
    pub email: Option<String>,
}

/// Feed as returned by the API.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    /// Feed ID.
    pub id: i64,
    /// Feed URL.
    pub url: String,
    /// Title.
    pub title: String,
    /// Site link.
    pub site_link: String,
    /// Last fetch (RFC 3339).
    pub last_fetched_at: Option<String>,
    /// Consecutive sweep failures.
    pub error_count: i32,
    /// Last sweep failure.
    pub last_error: Option<String>,
}

impl From<Feed> for FeedResponse {
    fn from(feed: Feed) -> Self {
        Self {
            id: feed.id,
            url: feed.url,
            title: feed.title,
            site_link: feed.site_link,
            last_fetched_at: feed.last_fetched_at.map(|dt| dt.to_rfc3339()),
            error_count: feed.error_count,
            last_error: feed.last_error,
        }
    }
}

/// Article as shown on the dashboard.
#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    /// Article ID.
    pub id: i64,
    /// Feed ID.
    pub feed_id: i64,
    /// Feed title.
    pub feed_title: String,
    /// Title.
    pub title: String,
    /// Content.
    pub content: String,
    /// Link.
    pub url: String,
    /// Publish time (RFC 3339).
    pub published_at: String,
    /// Read flag.
    pub is_read: bool,
    /// Saved flag.
    pub is_saved: bool,
}

impl From<DashboardArticle> for ArticleResponse {
    fn from(article: DashboardArticle) -> Self {
        Self {
            id: article.id,
            feed_id: article.feed_id,
            feed_title: article.feed_title,
            title: article.title,
            content: article.content,
            url: article.url,
            published_at: article.published_at.to_rfc3339(),
            is_read: article.is_read,
            is_saved: article.is_saved,
        }
    }
}

/// Dashboard view.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Subscribed feeds.
    pub feeds: Vec<FeedResponse>,
    /// Newest articles first.
    pub articles: Vec<ArticleResponse>,
    /// Applied feed filter.
    pub current_feed_id: Option<i64>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(dashboard: Dashboard) -> Self {
        Self {
            feeds: dashboard.feeds.into_iter().map(FeedResponse::from).collect(),
            articles: dashboard
                .articles
                .into_iter()
                .map(ArticleResponse::from)
                .collect(),
            current_feed_id: dashboard.current_feed_id,
        }
    }
}

/// Result of adding a feed.
#[derive(Debug, Serialize)]
pub struct AddFeedResponse {
    /// The feed.
    pub feed: FeedResponse,
    /// Articles new to the datastore.
    pub new_articles: u64,
    /// False if the user was already subscribed.
    pub newly_subscribed: bool,
    /// Non-fatal fetch issues.
    pub warnings: Vec<String>,
}

impl From<AddedFeed> for AddFeedResponse {
    fn from(added: AddedFeed) -> Self {
        Self {
            feed: added.feed.into(),
            new_articles: added.new_articles,
            newly_subscribed: added.newly_subscribed,
            warnings: added.warnings,
        }
    }
}

/// Health check body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok".
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}
