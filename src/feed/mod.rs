//! Feed ingestion for Folo-Lite.
//!
//! Fetching and normalizing feed documents, persisting feeds and articles,
//! and the background sweep that keeps every feed fresh.

pub mod fetcher;
pub mod ingest;
pub mod normalize;
pub mod repository;
pub mod sweep;
pub mod types;

pub use fetcher::{parse_document, validate_url, FeedFetcher};
pub use ingest::{ingest_feed, FeedIngestor, IngestReport, RetryPolicy};
pub use normalize::{fetch_and_normalize, normalize, synthetic_id};
pub use repository::{ArticleRepository, FeedRepository};
pub use sweep::{SweepHandle, SweepReport, SweepState, SweepWorker};
pub use types::{
    Article, ArticleRecord, Feed, FeedRecord, NormalizedFeed, ParseOutcome,
    DEFAULT_ARTICLE_TITLE, SYNTHETIC_ID_PREFIX,
};
