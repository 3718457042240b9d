//! HTTP fetching: politeness pacing, bounded retries, typed outcomes.
//!
//! The fetcher is total: every call returns a [`FetchOutcome`], never an
//! error across the boundary. Transient failures are retried with linear
//! backoff; terminal conditions (non-HTML content, non-retryable status)
//! short-circuit without consuming further attempts.

mod http;

pub use http::HttpFetcher;

use async_trait::async_trait;

use crate::errors::FetchFailure;

/// A successfully fetched HTML page.
///
/// Carries the raw body text; parsing happens in the extractor so the
/// outcome can cross await boundaries (`scraper::Html` is not `Send`).
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL requested.
    pub url: String,
    /// The final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub html: String,
    /// Wall-clock time for the whole fetch, retries included.
    pub duration_ms: f64,
}

/// Outcome of a fetch operation.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The fetch produced an HTML page.
    Page(FetchedPage),
    /// The fetch ended in a terminal failure.
    Failed(FetchFailure),
}

impl FetchOutcome {
    /// Consumes the outcome, returning the page when present.
    #[must_use]
    pub fn page(self) -> Option<FetchedPage> {
        match self {
            Self::Page(page) => Some(page),
            Self::Failed(_) => None,
        }
    }

    /// Whether the outcome carries a page.
    #[must_use]
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page(_))
    }

    /// Borrows the failure when present.
    #[must_use]
    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Page(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Protocol for HTTP fetching.
///
/// Implementations own their politeness policy: callers must tolerate call
/// latency on the order of the configured pacing and retry delays.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a URL, always returning an outcome.
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> FetchedPage {
        FetchedPage {
            url: "https://example.com".to_string(),
            final_url: "https://example.com".to_string(),
            status: 200,
            html: "<html></html>".to_string(),
            duration_ms: 1.0,
        }
    }

    #[test]
    fn test_outcome_page_accessors() {
        let outcome = FetchOutcome::Page(page());
        assert!(outcome.is_page());
        assert!(outcome.failure().is_none());
        assert_eq!(outcome.page().map(|p| p.status), Some(200));
    }

    #[test]
    fn test_outcome_failure_accessors() {
        let outcome = FetchOutcome::Failed(FetchFailure::HttpStatus { status: 404 });
        assert!(!outcome.is_page());
        assert_eq!(
            outcome.failure(),
            Some(&FetchFailure::HttpStatus { status: 404 })
        );
        assert!(outcome.page().is_none());
    }
}
