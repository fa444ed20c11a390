//! Folo-Lite - a minimal RSS/Atom reader.
//!
//! Feeds are fetched over HTTP, normalized and stored with idempotent
//! upserts. Users subscribe to feeds, track read/saved state and browse a
//! dashboard through the JSON API, while a background sweep keeps every
//! stored feed up to date.

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod reader;
pub mod shutdown;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{FoloError, Result};
pub use feed::{FeedFetcher, FeedIngestor, RetryPolicy, SweepWorker};
pub use reader::ReaderService;
