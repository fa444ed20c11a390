//! Reader operations used by the API handlers.

use serde::Serialize;
use tracing::info;

use super::dashboard::{Dashboard, DashboardQuery};
use super::state::ReadStateRepository;
use super::subscription::SubscriptionRepository;
use crate::feed::{Feed, FeedIngestor, FeedRepository};
use crate::{FoloError, Result};

/// Result of adding a feed for a user.
#[derive(Debug, Clone, Serialize)]
pub struct AddedFeed {
    /// The stored feed.
    pub feed: Feed,
    /// Articles stored for the first time by this request.
    pub new_articles: u64,
    /// False when the user was already subscribed.
    pub newly_subscribed: bool,
    /// Non-fatal issues found while fetching.
    pub warnings: Vec<String>,
}

/// Service for reader operations on behalf of one request.
pub struct ReaderService<'a> {
    ingestor: &'a FeedIngestor,
}

impl<'a> ReaderService<'a> {
    /// Create a new service.
    pub fn new(ingestor: &'a FeedIngestor) -> Self {
        Self { ingestor }
    }

    /// Ingest the feed at `url` now and subscribe the user to it.
    ///
    /// # Errors
    ///
    /// - `Validation` if the URL is empty or not an allowed http(s) URL
    /// - `FeedUnreadable` if the document cannot be parsed
    /// - `PersistenceFailure` if the datastore rejects the write
    pub async fn add_feed(&self, user_id: &str, url: &str) -> Result<AddedFeed> {
        let url = url.trim();
        if url.is_empty() {
            return Err(FoloError::Validation("feed URL is required".to_string()));
        }

        let report = self.ingestor.ingest(url).await?;
        let pool = self.ingestor.db().pool();

        let newly_subscribed = SubscriptionRepository::new(pool)
            .subscribe(user_id, report.feed_id)
            .await?;
        let feed = FeedRepository::new(pool)
            .get_by_id(report.feed_id)
            .await?
            .ok_or_else(|| FoloError::NotFound("feed".to_string()))?;

        info!(user = %user_id, feed = %url, newly_subscribed, "Feed added");

        Ok(AddedFeed {
            feed,
            new_articles: report.new_articles,
            newly_subscribed,
            warnings: report.warnings,
        })
    }

    /// Mark an article read for the user.
    ///
    /// Articles outside the user's subscriptions are `NotFound`.
    pub async fn mark_read(&self, user_id: &str, article_id: i64) -> Result<()> {
        self.ensure_article(user_id, article_id).await?;
        ReadStateRepository::new(self.ingestor.db().pool())
            .mark_read(user_id, article_id)
            .await
    }

    /// Save or unsave an article for the user.
    pub async fn set_saved(&self, user_id: &str, article_id: i64, saved: bool) -> Result<()> {
        self.ensure_article(user_id, article_id).await?;
        ReadStateRepository::new(self.ingestor.db().pool())
            .set_saved(user_id, article_id, saved)
            .await
    }

    /// Load a dashboard.
    pub async fn dashboard(&self, query: &DashboardQuery) -> Result<Dashboard> {
        query.load(self.ingestor.db().pool()).await
    }

    async fn ensure_article(&self, user_id: &str, article_id: i64) -> Result<()> {
        let visible = SubscriptionRepository::new(self.ingestor.db().pool())
            .has_article(user_id, article_id)
            .await?;
        if !visible {
            return Err(FoloError::NotFound("article".to_string()));
        }
        Ok(())
    }
}
