//! Error types for Folo-Lite.

use thiserror::Error;

/// Common error type for Folo-Lite.
#[derive(Error, Debug)]
pub enum FoloError {
    /// Database error.
    ///
    /// Statement-level failures (constraint violations, permission denial,
    /// malformed SQL) land here.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    ///
    /// The pool could not hand out a working connection. These are the only
    /// persistence errors worth retrying.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The feed could not be fetched or parsed into anything usable.
    #[error("could not parse feed {url}: {reason}")]
    FeedUnreadable {
        /// Feed URL.
        url: String,
        /// Transport or parser message.
        reason: String,
    },

    /// The datastore rejected a write made on behalf of a feed.
    #[error("failed to persist feed {url}: {source}")]
    PersistenceFailure {
        /// Feed URL the write belonged to.
        url: String,
        /// Underlying database error.
        #[source]
        source: Box<FoloError>,
    },
}

impl FoloError {
    /// Wrap a database error with the feed URL it was raised for.
    pub fn persistence(url: impl Into<String>, source: FoloError) -> Self {
        FoloError::PersistenceFailure {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Whether retrying the failed operation could succeed.
    ///
    /// Only connection-class persistence failures qualify; an unreadable
    /// feed stays unreadable.
    pub fn is_transient(&self) -> bool {
        match self {
            FoloError::DatabaseConnection(_) => true,
            FoloError::PersistenceFailure { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for FoloError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => FoloError::DatabaseConnection(e.to_string()),
            other => FoloError::Database(other.to_string()),
        }
    }
}

/// Result type alias for Folo-Lite operations.
pub type Result<T> = std::result::Result<T, FoloError>;
