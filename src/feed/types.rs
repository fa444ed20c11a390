//! Feed and article types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Title given to articles whose entry carries none.
pub const DEFAULT_ARTICLE_TITLE: &str = "No Title";

/// Prefix of external ids synthesized for entries with neither id nor link.
pub const SYNTHETIC_ID_PREFIX: &str = "urn:sha256:";

/// Number of article rows written per INSERT statement.
pub const ARTICLE_INSERT_CHUNK: usize = 100;

/// Feed metadata as extracted from a parsed document, ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord {
    /// Feed URL (identity).
    pub url: String,
    /// Feed title (the URL when the document has none).
    pub title: String,
    /// Link to the site the feed belongs to (may be empty).
    pub site_link: String,
    /// When the document was fetched.
    pub last_fetched_at: DateTime<Utc>,
}

/// One entry of a parsed document, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    /// Entry id, link, or a synthetic `urn:sha256:` id.
    pub external_id: String,
    /// Entry title.
    pub title: String,
    /// Summary or body text, truncated.
    pub content: String,
    /// Entry link (may be empty).
    pub url: String,
    /// Publish time, or the fetch time when the entry has none.
    pub published_at: DateTime<Utc>,
}

/// Output of the fetch-and-normalize step.
#[derive(Debug, Clone)]
pub struct NormalizedFeed {
    /// Feed record.
    pub feed: FeedRecord,
    /// Article records in document order.
    pub articles: Vec<ArticleRecord>,
    /// Non-fatal issues found while fetching or normalizing.
    pub warnings: Vec<String>,
}

/// Result of fetching and parsing a feed document.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The document parsed, possibly with recoverable problems.
    Usable {
        /// Parsed document.
        feed: feed_rs::model::Feed,
        /// Recoverable problems.
        warnings: Vec<String>,
    },
    /// Nothing usable could be extracted.
    Unreadable {
        /// Transport or parser message.
        reason: String,
    },
}

impl ParseOutcome {
    /// Whether the outcome carries a parsed document.
    pub fn is_usable(&self) -> bool {
        matches!(self, ParseOutcome::Usable { .. })
    }
}

/// A stored feed.
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// Feed URL.
    pub url: String,
    /// Feed title.
    pub title: String,
    /// Site link.
    pub site_link: String,
    /// Last successful fetch.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// Consecutive sweep failures.
    pub error_count: i32,
    /// Last sweep failure message.
    pub last_error: Option<String>,
    /// When the feed was first stored.
    pub created_at: DateTime<Utc>,
}

/// A stored article.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    /// Article ID.
    pub id: i64,
    /// Owning feed ID.
    pub feed_id: i64,
    /// External id, unique per feed.
    pub external_id: String,
    /// Title.
    pub title: String,
    /// Content.
    pub content: String,
    /// Link.
    pub url: String,
    /// Publish time.
    pub published_at: DateTime<Utc>,
    /// When the article was first stored.
    pub created_at: DateTime<Utc>,
}
