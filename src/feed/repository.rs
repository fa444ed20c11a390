//! Feed and article repositories.
//!
//! Both write paths are single upsert statements resolved by the unique
//! constraints on `feeds.url` and `articles(feed_id, external_id)`, so
//! concurrent ingestion of the same feed needs no application lock.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::types::{Article, ArticleRecord, Feed, FeedRecord, ARTICLE_INSERT_CHUNK};
use crate::db::{format_datetime, parse_datetime, Db, DbPool};
use crate::{FoloError, Result};

/// Row type for a feed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct FeedRow {
    id: i64,
    url: String,
    title: String,
    site_link: String,
    last_fetched_at: Option<String>,
    error_count: i32,
    last_error: Option<String>,
    created_at: String,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            url: row.url,
            title: row.title,
            site_link: row.site_link,
            last_fetched_at: row.last_fetched_at.and_then(|s| parse_datetime(&s)),
            error_count: row.error_count,
            last_error: row.last_error,
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for an article.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    feed_id: i64,
    external_id: String,
    title: String,
    content: String,
    url: String,
    published_at: String,
    created_at: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            feed_id: row.feed_id,
            external_id: row.external_id,
            title: row.title,
            content: row.content,
            url: row.url,
            published_at: parse_datetime(&row.published_at).unwrap_or_else(Utc::now),
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

const FEED_COLUMNS: &str =
    "id, url, title, site_link, last_fetched_at, error_count, last_error, created_at";

const ARTICLE_COLUMNS: &str =
    "id, feed_id, external_id, title, content, url, published_at, created_at";

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert the feed or refresh its metadata, returning its id.
    ///
    /// A refresh also clears the error counters kept by the sweep worker.
    /// Errors are wrapped in [`FoloError::PersistenceFailure`].
    pub async fn upsert_feed(&self, record: &FeedRecord) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO feeds (url, title, site_link, last_fetched_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (url) DO UPDATE SET
                title = excluded.title,
                site_link = excluded.site_link,
                last_fetched_at = excluded.last_fetched_at,
                error_count = 0,
                last_error = NULL
            RETURNING id
            "#,
        )
        .bind(&record.url)
        .bind(&record.title)
        .bind(&record.site_link)
        .bind(format_datetime(&record.last_fetched_at))
        .fetch_one(self.pool)
        .await
        .map_err(|e| FoloError::persistence(&record.url, e.into()))?;

        Ok(id)
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = $1");
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = $1");
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Feed::from))
    }

    /// List every known feed URL (registration order).
    pub async fn list_urls(&self) -> Result<Vec<String>> {
        let urls: Vec<String> = sqlx::query_scalar("SELECT url FROM feeds ORDER BY id ASC")
            .fetch_all(self.pool)
            .await?;

        Ok(urls)
    }

    /// Record a failed sweep attempt for the feed at `url`.
    ///
    /// Returns false if no feed has that URL.
    pub async fn record_failure(&self, url: &str, error: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE feeds SET error_count = error_count + 1, last_error = $1 WHERE url = $2",
        )
        .bind(error)
        .bind(url)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all feeds.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

/// Repository for article operations.
pub struct ArticleRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert articles for a feed, silently skipping known external ids.
    ///
    /// All chunks are written in one transaction. Returns how many rows were
    /// new. `feed_url` only labels a [`FoloError::PersistenceFailure`].
    pub async fn upsert_articles(
        &self,
        feed_id: i64,
        feed_url: &str,
        articles: &[ArticleRecord],
    ) -> Result<u64> {
        if articles.is_empty() {
            return Ok(0);
        }

        self.insert_ignoring_duplicates(feed_id, articles)
            .await
            .map_err(|e| FoloError::persistence(feed_url, e))
    }

    async fn insert_ignoring_duplicates(
        &self,
        feed_id: i64,
        articles: &[ArticleRecord],
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in articles.chunks(ARTICLE_INSERT_CHUNK) {
            let mut query: QueryBuilder<Db> = QueryBuilder::new(
                "INSERT INTO articles (feed_id, external_id, title, content, url, published_at) ",
            );
            query.push_values(chunk, |mut row, article| {
                row.push_bind(feed_id)
                    .push_bind(&article.external_id)
                    .push_bind(&article.title)
                    .push_bind(&article.content)
                    .push_bind(&article.url)
                    .push_bind(format_datetime(&article.published_at));
            });
            query.push(" ON CONFLICT (feed_id, external_id) DO NOTHING");

            inserted += query.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Get an article by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Article::from))
    }

    /// Get an article by feed ID and external id.
    pub async fn get_by_external_id(
        &self,
        feed_id: i64,
        external_id: &str,
    ) -> Result<Option<Article>> {
        let query = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE feed_id = $1 AND external_id = $2"
        );
        let row = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(feed_id)
            .bind(external_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Article::from))
    }

    /// Count articles of a feed.
    pub async fn count_by_feed(&self, feed_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE feed_id = $1")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
