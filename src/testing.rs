//! Test doubles and page fixtures.
//!
//! Shared by this crate's own tests and usable by downstream crates that
//! want to exercise scrape flows without network access.

use parking_lot::Mutex;
use std::collections::VecDeque;

use async_trait::async_trait;

use crate::errors::FetchFailure;
use crate::fetch::{FetchOutcome, FetchedPage, Fetcher};
use crate::history::SearchHistory;

/// One scripted response for a [`StaticFetcher`].
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Serve this HTML with a 200 status.
    Html(String),
    /// Fail with this terminal failure.
    Failure(FetchFailure),
}

/// A fetcher that serves scripted responses in order.
///
/// Records every requested URL; an empty script produces a network
/// failure so a test that over-fetches fails loudly.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Creates a fetcher with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an HTML page.
    #[must_use]
    pub fn with_page(self, html: impl Into<String>) -> Self {
        self.responses
            .lock()
            .push_back(ScriptedResponse::Html(html.into()));
        self
    }

    /// Queues a terminal failure.
    #[must_use]
    pub fn with_failure(self, failure: FetchFailure) -> Self {
        self.responses
            .lock()
            .push_back(ScriptedResponse::Failure(failure));
        self
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.requests.lock().push(url.to_string());

        match self.responses.lock().pop_front() {
            Some(ScriptedResponse::Html(html)) => FetchOutcome::Page(FetchedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                html,
                duration_ms: 0.0,
            }),
            Some(ScriptedResponse::Failure(failure)) => FetchOutcome::Failed(failure),
            None => FetchOutcome::Failed(FetchFailure::Network {
                message: format!("no scripted response for {url}"),
            }),
        }
    }
}

/// A history store that records calls for assertions.
#[derive(Debug, Default)]
pub struct RecordingHistory {
    calls: Mutex<Vec<(String, bool)>>,
}

impl RecordingHistory {
    /// Creates an empty recording history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(query, success)` pairs, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().clone()
    }
}

impl SearchHistory for RecordingHistory {
    fn record_search(&self, query: &str, success: bool) {
        self.calls.lock().push((query.to_string(), success));
    }
}

/// Page fixtures shaped like the remote site's embedded-JSON pages.
pub mod fixtures {
    fn embed_json(payload: &serde_json::Value) -> String {
        format!(
            r#"<html><head><script type="application/json">{payload}</script></head><body></body></html>"#
        )
    }

    /// A search results page with one entry per `(title, release_text, id)`.
    #[must_use]
    pub fn search_page(entries: &[(&str, &str, &str)]) -> String {
        let results: Vec<serde_json::Value> = entries
            .iter()
            .map(|(title, release, id)| {
                serde_json::json!({
                    "titleNameText": title,
                    "titleReleaseText": release,
                    "id": id,
                })
            })
            .collect();

        embed_json(&serde_json::json!({
            "props": { "pageProps": { "titleResults": { "results": results } } }
        }))
    }

    /// A detail page wrapping the given `pageProps` payload.
    #[must_use]
    pub fn detail_page(page_props: serde_json::Value) -> String {
        embed_json(&serde_json::json!({
            "props": { "pageProps": page_props }
        }))
    }
}
