//! Error types for cinescrape.
//!
//! The taxonomy separates transient fetch failures (retried internally and
//! surfaced as values), terminal response problems (never retried), and
//! record validation failures (constructible-but-invalid conditions).

use thiserror::Error;

/// The umbrella error type for scraper operations.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A fetch ended in a terminal failure.
    #[error("{0}")]
    Fetch(#[from] FetchFailure),

    /// A record failed field validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The HTTP client could not be constructed.
    #[error("http client error: {0}")]
    Client(String),

    /// An exchange-format map was missing or mistyped a field.
    #[error("exchange format error: {0}")]
    Exchange(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terminal outcome of a failed fetch.
///
/// Returned as a value inside [`crate::fetch::FetchOutcome`]; a fetch never
/// raises across its boundary. Transient conditions are retried before one
/// of these is produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchFailure {
    /// Network-level failure (connection reset, DNS, protocol).
    #[error("network error: {message}")]
    Network {
        /// Description of the underlying failure.
        message: String,
    },

    /// The request exceeded the configured timeout.
    #[error("request timed out: {message}")]
    Timeout {
        /// Description of the timeout.
        message: String,
    },

    /// A non-2xx status that is not in the retryable set.
    #[error("unexpected HTTP status {status}")]
    HttpStatus {
        /// The response status code.
        status: u16,
    },

    /// The response content type was not HTML-like. Never retried.
    #[error("non-HTML response: {content_type}")]
    NonHtml {
        /// The offending content type, or an empty string when absent.
        content_type: String,
    },

    /// Every attempt ended in a transient failure.
    #[error("fetch failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// How many attempts were made.
        attempts: usize,
        /// The last transient error observed.
        last_error: String,
    },
}

impl FetchFailure {
    /// Short machine-readable label for the failure class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::NonHtml { .. } => "non_html",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

/// A record failed a field-level constraint during construction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// Title absent or blank.
    #[error("movie title cannot be empty")]
    EmptyTitle,

    /// Title longer than the configured maximum.
    #[error("movie title too long: {length} chars (max {max})")]
    TitleTooLong {
        /// Character count of the offending title.
        length: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Rating outside the configured range.
    #[error("invalid rating: {rating}")]
    RatingOutOfRange {
        /// The offending rating.
        rating: f64,
    },

    /// Year outside the configured range.
    #[error("invalid year: {year}")]
    YearOutOfRange {
        /// The offending year.
        year: i32,
    },
}
