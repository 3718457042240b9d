//! Observability callbacks for scrape operations.
//!
//! The scraper never installs a global logging configuration; hosts that
//! want visibility inject a [`ScrapeObserver`] and receive structured
//! callbacks alongside the crate's `tracing` output.

/// Callbacks for fetch lifecycle events.
///
/// Implementations must be cheap and non-blocking; they run on the fetch
/// path.
pub trait ScrapeObserver: Send + Sync {
    /// Called when a fetch starts (before the first attempt).
    fn on_fetch_start(&self, url: &str, request_id: &str);

    /// Called before a retry wait after a transient failure.
    fn on_fetch_retry(&self, url: &str, request_id: &str, attempt: usize, delay_ms: u64, error: &str);

    /// Called when a fetch returns a page.
    fn on_fetch_complete(&self, url: &str, request_id: &str, status: u16, duration_ms: f64);

    /// Called when a fetch ends in a terminal failure.
    fn on_fetch_failed(&self, url: &str, request_id: &str, error: &str);
}

/// No-op implementation of [`ScrapeObserver`].
///
/// Used as the default when no observer is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpScrapeObserver;

impl ScrapeObserver for NoOpScrapeObserver {
    fn on_fetch_start(&self, _url: &str, _request_id: &str) {}
    fn on_fetch_retry(&self, _url: &str, _request_id: &str, _attempt: usize, _delay_ms: u64, _error: &str) {}
    fn on_fetch_complete(&self, _url: &str, _request_id: &str, _status: u16, _duration_ms: f64) {}
    fn on_fetch_failed(&self, _url: &str, _request_id: &str, _error: &str) {}
}

/// A collecting observer for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: parking_lot::RwLock<Vec<(String, serde_json::Value)>>,
}

impl CollectingObserver {
    /// Creates a new collecting observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, serde_json::Value)> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, serde_json::Value)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    fn push(&self, event_type: &str, data: serde_json::Value) {
        self.events.write().push((event_type.to_string(), data));
    }
}

impl ScrapeObserver for CollectingObserver {
    fn on_fetch_start(&self, url: &str, request_id: &str) {
        self.push(
            "fetch.start",
            serde_json::json!({ "url": url, "request_id": request_id }),
        );
    }

    fn on_fetch_retry(&self, url: &str, request_id: &str, attempt: usize, delay_ms: u64, error: &str) {
        self.push(
            "fetch.retry",
            serde_json::json!({
                "url": url,
                "request_id": request_id,
                "attempt": attempt,
                "delay_ms": delay_ms,
                "error": error,
            }),
        );
    }

    fn on_fetch_complete(&self, url: &str, request_id: &str, status: u16, duration_ms: f64) {
        self.push(
            "fetch.complete",
            serde_json::json!({
                "url": url,
                "request_id": request_id,
                "status": status,
                "duration_ms": duration_ms,
            }),
        );
    }

    fn on_fetch_failed(&self, url: &str, request_id: &str, error: &str) {
        self.push(
            "fetch.failed",
            serde_json::json!({ "url": url, "request_id": request_id, "error": error }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_observer() {
        let observer = NoOpScrapeObserver;
        observer.on_fetch_start("https://example.com", "req-1");
        observer.on_fetch_retry("https://example.com", "req-1", 1, 1000, "boom");
        observer.on_fetch_complete("https://example.com", "req-1", 200, 12.0);
        observer.on_fetch_failed("https://example.com", "req-1", "boom");
        // Should not panic
    }

    #[test]
    fn test_collecting_observer() {
        let observer = CollectingObserver::new();
        assert!(observer.is_empty());

        observer.on_fetch_start("https://example.com", "req-1");
        observer.on_fetch_retry("https://example.com", "req-1", 1, 500, "reset");
        observer.on_fetch_complete("https://example.com", "req-1", 200, 42.0);

        assert_eq!(observer.len(), 3);
        let events = observer.events();
        assert_eq!(events[0].0, "fetch.start");
        assert_eq!(events[1].0, "fetch.retry");
        assert_eq!(events[1].1["attempt"], serde_json::json!(1));
        assert_eq!(events[2].1["status"], serde_json::json!(200));
    }

    #[test]
    fn test_collecting_observer_filter_and_clear() {
        let observer = CollectingObserver::new();
        observer.on_fetch_start("a", "1");
        observer.on_fetch_failed("a", "1", "oops");

        assert_eq!(observer.events_of_type("fetch.failed").len(), 1);
        assert_eq!(observer.events_of_type("fetch.").len(), 2);

        observer.clear();
        assert!(observer.is_empty());
    }
}
