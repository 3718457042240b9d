//! reqwest-backed fetcher with pacing and linear-backoff retries.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{FetchOutcome, FetchedPage, Fetcher};
use crate::config::FetchConfig;
use crate::errors::{FetchFailure, ScrapeError};
use crate::events::{NoOpScrapeObserver, ScrapeObserver};

/// Result of a single attempt, before retry policy is applied.
enum AttemptError {
    /// Worth retrying: network error, timeout, retryable status.
    Transient(String),
    /// Not worth retrying: wrong content type, non-retryable status.
    Terminal(FetchFailure),
}

/// HTTP fetcher with a shared politeness clock.
///
/// All requests through one instance share the pacing state: a request is
/// delayed until at least the configured minimum has elapsed since the
/// previous request, including failed attempts. The pacing check and the
/// timestamp update happen under one lock, so concurrent callers cannot
/// race past the minimum-delay check.
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
    last_request: Mutex<Option<Instant>>,
    observer: Arc<dyn ScrapeObserver>,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpFetcher {
    /// Creates a fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            // Invalid header entries are skipped rather than fatal.
            let Ok(name) = HeaderName::from_bytes(key.as_bytes()) else {
                warn!(header = %key, "skipping invalid header name");
                continue;
            };
            let Ok(value) = HeaderValue::from_str(value) else {
                warn!(header = %key, "skipping invalid header value");
                continue;
            };
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ScrapeError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            last_request: Mutex::new(None),
            observer: Arc::new(NoOpScrapeObserver),
        })
    }

    /// Sets the observer for fetch lifecycle events.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScrapeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Waits out the minimum inter-request spacing, then claims the clock.
    ///
    /// The lock is held across the wait so a second caller queues behind it
    /// instead of observing a stale timestamp.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let min_delay = self.config.min_request_delay();
            let elapsed = previous.elapsed();
            if elapsed < min_delay {
                tokio::time::sleep(min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Issues one request and classifies the result.
    async fn attempt(&self, url: &str) -> Result<FetchedPage, AttemptError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(AttemptError::Transient(format!("timeout: {e}")));
            }
            Err(e) => {
                return Err(AttemptError::Transient(format!("request error: {e}")));
            }
        };

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            if self.config.should_retry_status(status) {
                return Err(AttemptError::Transient(format!("retryable status {status}")));
            }
            return Err(AttemptError::Terminal(FetchFailure::HttpStatus { status }));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(AttemptError::Terminal(FetchFailure::NonHtml { content_type }));
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| AttemptError::Transient(format!("body read error: {e}")))?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status,
            html,
            duration_ms: 0.0,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        self.observer.on_fetch_start(url, &request_id);

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            // Pacing state advances on every attempt, including failed ones.
            self.pace().await;
            debug!(url, attempt, "issuing request");

            match self.attempt(url).await {
                Ok(mut page) => {
                    page.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
                    debug!(url, status = page.status, attempt, "fetch succeeded");
                    self.observer
                        .on_fetch_complete(url, &request_id, page.status, page.duration_ms);
                    return FetchOutcome::Page(page);
                }
                Err(AttemptError::Terminal(failure)) => {
                    warn!(url, error = %failure, "fetch failed without retry");
                    self.observer
                        .on_fetch_failed(url, &request_id, &failure.to_string());
                    return FetchOutcome::Failed(failure);
                }
                Err(AttemptError::Transient(message)) => {
                    last_error = message;
                    if attempt < max_attempts {
                        let delay = self.config.retry_delay(attempt);
                        warn!(
                            url,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %last_error,
                            "transient fetch failure, retrying"
                        );
                        self.observer.on_fetch_retry(
                            url,
                            &request_id,
                            attempt,
                            delay.as_millis() as u64,
                            &last_error,
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let failure = FetchFailure::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        };
        warn!(url, error = %failure, "fetch attempts exhausted");
        self.observer
            .on_fetch_failed(url, &request_id, &failure.to_string());
        FetchOutcome::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingObserver;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = "<html><body>ok</body></html>";

    fn html_response() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(BODY, "text/html; charset=utf-8")
    }

    fn fast_config() -> FetchConfig {
        FetchConfig::new()
            .with_timeout(5.0)
            .with_base_retry_delay(0.02)
            .with_min_request_delay(0.0)
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(html_response())
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(fast_config()).unwrap();
        let outcome = fetcher.fetch(&format!("{}/page", server.uri())).await;

        let page = outcome.page().unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.html, BODY);
    }

    #[tokio::test]
    async fn test_transient_failures_then_success_with_linear_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(html_response())
            .expect(1)
            .mount(&server)
            .await;

        let observer = Arc::new(CollectingObserver::new());
        let fetcher = HttpFetcher::new(fast_config())
            .unwrap()
            .with_observer(observer.clone());

        let started = Instant::now();
        let outcome = fetcher.fetch(&format!("{}/flaky", server.uri())).await;
        let elapsed = started.elapsed();

        assert!(outcome.is_page());
        // Waits 1x then 2x the base delay between the three attempts.
        assert!(elapsed >= std::time::Duration::from_millis(60), "elapsed {elapsed:?}");

        let retries = observer.events_of_type("fetch.retry");
        assert_eq!(retries.len(), 2);
        assert_eq!(retries[0].1["attempt"], serde_json::json!(1));
        assert_eq!(retries[0].1["delay_ms"], serde_json::json!(20));
        assert_eq!(retries[1].1["delay_ms"], serde_json::json!(40));
        assert_eq!(observer.events_of_type("fetch.complete").len(), 1);
    }

    #[tokio::test]
    async fn test_all_attempts_fail_returns_terminal_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(fast_config()).unwrap();
        let outcome = fetcher.fetch(&format!("{}/down", server.uri())).await;

        match outcome.failure() {
            Some(FetchFailure::RetriesExhausted { attempts, .. }) => assert_eq!(*attempts, 3),
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_html_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(fast_config()).unwrap();
        let outcome = fetcher.fetch(&format!("{}/api", server.uri())).await;

        match outcome.failure() {
            Some(FetchFailure::NonHtml { content_type }) => {
                assert!(content_type.contains("application/json"));
            }
            other => panic!("expected NonHtml, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_status_fails_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(fast_config()).unwrap();
        let outcome = fetcher.fetch(&format!("{}/missing", server.uri())).await;

        assert_eq!(
            outcome.failure(),
            Some(&FetchFailure::HttpStatus { status: 404 })
        );
    }

    #[tokio::test]
    async fn test_minimum_spacing_between_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html_response())
            .expect(2)
            .mount(&server)
            .await;

        let config = fast_config().with_min_request_delay(0.05);
        let fetcher = HttpFetcher::new(config).unwrap();
        let url = format!("{}/page", server.uri());

        let started = Instant::now();
        assert!(fetcher.fetch(&url).await.is_page());
        assert!(fetcher.fetch(&url).await.is_page());
        let elapsed = started.elapsed();

        assert!(elapsed >= std::time::Duration::from_millis(50), "elapsed {elapsed:?}");
    }
}
