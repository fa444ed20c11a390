//! Subscription repository.

use chrono::Utc;

use crate::db::{format_datetime, DbPool};
use crate::feed::repository::FeedRow;
use crate::feed::Feed;
use crate::Result;

/// Repository for user subscriptions.
pub struct SubscriptionRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Subscribe a user to a feed.
    ///
    /// Returns false when the subscription already existed.
    pub async fn subscribe(&self, user_id: &str, feed_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, feed_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, feed_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(format_datetime(&Utc::now()))
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check whether a user is subscribed to a feed.
    pub async fn is_subscribed(&self, user_id: &str, feed_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subscriptions WHERE user_id = $1 AND feed_id = $2",
        )
        .bind(user_id)
        .bind(feed_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Check whether an article belongs to one of the user's feeds.
    pub async fn has_article(&self, user_id: &str, article_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM articles a
            INNER JOIN subscriptions s ON s.feed_id = a.feed_id
            WHERE s.user_id = $1 AND a.id = $2
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// List the feeds a user is subscribed to, ordered by title.
    pub async fn list_feeds(&self, user_id: &str) -> Result<Vec<Feed>> {
        let rows = sqlx::query_as::<_, FeedRow>(
            r#"
            SELECT f.id, f.url, f.title, f.site_link, f.last_fetched_at,
                   f.error_count, f.last_error, f.created_at
            FROM subscriptions s
            INNER JOIN feeds f ON f.id = s.feed_id
            WHERE s.user_id = $1
            ORDER BY f.title ASC, f.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Feed::from).collect())
    }
}
