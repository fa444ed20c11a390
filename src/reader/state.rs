//! Per-user article state (read / saved).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{format_datetime, parse_datetime, DbPool};
use crate::Result;

/// A user's state for one article.
///
/// No stored row means both flags are false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadState {
    /// User ID.
    pub user_id: String,
    /// Article ID.
    pub article_id: i64,
    /// Whether the article was opened.
    pub is_read: bool,
    /// Whether the article is bookmarked.
    pub is_saved: bool,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ReadStateRow {
    user_id: String,
    article_id: i64,
    is_read: bool,
    is_saved: bool,
    updated_at: String,
}

impl From<ReadStateRow> for ReadState {
    fn from(row: ReadStateRow) -> Self {
        ReadState {
            user_id: row.user_id,
            article_id: row.article_id,
            is_read: row.is_read,
            is_saved: row.is_saved,
            updated_at: parse_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for article state.
pub struct ReadStateRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ReadStateRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Mark an article read. The saved flag is left as it was.
    pub async fn mark_read(&self, user_id: &str, article_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_article_states (user_id, article_id, is_read, is_saved, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, article_id) DO UPDATE SET
                is_read = excluded.is_read,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .bind(true)
        .bind(false)
        .bind(format_datetime(&Utc::now()))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set or clear the saved flag. The read flag is left as it was.
    pub async fn set_saved(&self, user_id: &str, article_id: i64, saved: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_article_states (user_id, article_id, is_read, is_saved, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, article_id) DO UPDATE SET
                is_saved = excluded.is_saved,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .bind(false)
        .bind(saved)
        .bind(format_datetime(&Utc::now()))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get the stored state, if any.
    pub async fn get(&self, user_id: &str, article_id: i64) -> Result<Option<ReadState>> {
        let row = sqlx::query_as::<_, ReadStateRow>(
            r#"
            SELECT user_id, article_id, is_read, is_saved, updated_at
            FROM user_article_states
            WHERE user_id = $1 AND article_id = $2
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ReadState::from))
    }
}
