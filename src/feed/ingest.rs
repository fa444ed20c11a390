//! Single-feed ingestion: fetch, normalize, upsert.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::fetcher::FeedFetcher;
use super::normalize::fetch_and_normalize;
use super::repository::{ArticleRepository, FeedRepository};
use super::types::NormalizedFeed;
use crate::config::IngestConfig;
use crate::db::Database;
use crate::Result;

/// Retry policy for connection-class persistence failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay; attempt `n` waits `n * backoff`.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Build the policy from the `[ingest]` configuration.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            max_retries: config.persistence_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Run `op`, retrying while it fails with a transient error.
    pub async fn run<T, F, Fut>(&self, url: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0_u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(feed = %url, attempt, error = %e, "Retrying persistence");
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

/// Result of ingesting one feed.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Feed URL.
    pub url: String,
    /// Datastore id of the feed.
    pub feed_id: i64,
    /// Articles not seen before this run.
    pub new_articles: u64,
    /// Articles in the document.
    pub total_articles: usize,
    /// Non-fatal issues found while fetching or normalizing.
    pub warnings: Vec<String>,
}

/// Runs the fetch, normalize and upsert pipeline for single feeds.
///
/// Shared by the add-feed request path and the sweep worker.
#[derive(Debug, Clone)]
pub struct FeedIngestor {
    db: Arc<Database>,
    fetcher: FeedFetcher,
    retry: RetryPolicy,
}

impl FeedIngestor {
    /// Create a new ingestor.
    pub fn new(db: Arc<Database>, fetcher: FeedFetcher, retry: RetryPolicy) -> Self {
        Self { db, fetcher, retry }
    }

    /// Get the database handle.
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Get the fetcher.
    pub fn fetcher(&self) -> &FeedFetcher {
        &self.fetcher
    }

    /// Ingest the feed at `url`.
    ///
    /// `FeedUnreadable` is returned as is. `PersistenceFailure` is retried
    /// per the [`RetryPolicy`] when its cause is a connection problem; the
    /// upserts are idempotent so a retried write cannot duplicate rows.
    pub async fn ingest(&self, url: &str) -> Result<IngestReport> {
        let normalized = fetch_and_normalize(&self.fetcher, url).await?;
        let (feed_id, new_articles) = self.retry.run(url, || self.store(&normalized)).await?;

        if new_articles > 0 {
            info!(feed = %url, feed_id, new_articles, "Feed ingested");
        } else {
            debug!(feed = %url, feed_id, "Feed ingested, no new articles");
        }

        Ok(IngestReport {
            url: url.to_string(),
            feed_id,
            new_articles,
            total_articles: normalized.articles.len(),
            warnings: normalized.warnings,
        })
    }

    /// Upsert a normalized feed and its articles.
    ///
    /// Returns the feed id and the number of new articles.
    pub async fn store(&self, normalized: &NormalizedFeed) -> Result<(i64, u64)> {
        store(&self.db, normalized).await
    }
}

async fn store(db: &Database, normalized: &NormalizedFeed) -> Result<(i64, u64)> {
    let feed_id = FeedRepository::new(db.pool())
        .upsert_feed(&normalized.feed)
        .await?;
    let new_articles = ArticleRepository::new(db.pool())
        .upsert_articles(feed_id, &normalized.feed.url, &normalized.articles)
        .await?;
    Ok((feed_id, new_articles))
}

/// Ingest the feed at `url` once, without retries, returning its id.
pub async fn ingest_feed(db: &Database, fetcher: &FeedFetcher, url: &str) -> Result<i64> {
    let normalized = fetch_and_normalize(fetcher, url).await?;
    let (feed_id, _) = store(db, &normalized).await?;
    Ok(feed_id)
}
