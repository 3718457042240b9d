//! Configuration types for fetching, extraction selectors, and validation.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Configuration for HTTP fetching and politeness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Maximum number of attempts per fetch (including the first).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Base delay between retries in seconds, multiplied by the attempt number.
    #[serde(default = "default_base_retry_delay")]
    pub base_retry_delay_seconds: f64,
    /// Minimum spacing between any two outbound requests in seconds.
    #[serde(default = "default_min_request_delay")]
    pub min_request_delay_seconds: f64,
    /// Headers attached to every request.
    #[serde(default = "default_headers")]
    pub headers: HashMap<String, String>,
    /// Status codes that count as transient and trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: HashSet<u16>,
}

fn default_timeout() -> f64 {
    10.0
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_retry_delay() -> f64 {
    1.0
}

fn default_min_request_delay() -> f64 {
    0.5
}

fn default_headers() -> HashMap<String, String> {
    [
        (
            "User-Agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
        ),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.5"),
        ("Accept-Encoding", "gzip, deflate"),
        ("Connection", "keep-alive"),
        ("Upgrade-Insecure-Requests", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_retry_status_codes() -> HashSet<u16> {
    [408, 429, 500, 502, 503, 504].into_iter().collect()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_attempts: default_max_attempts(),
            base_retry_delay_seconds: default_base_retry_delay(),
            min_request_delay_seconds: default_min_request_delay(),
            headers: default_headers(),
            retry_status_codes: default_retry_status_codes(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum attempts per fetch.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base retry delay.
    #[must_use]
    pub fn with_base_retry_delay(mut self, seconds: f64) -> Self {
        self.base_retry_delay_seconds = seconds;
        self
    }

    /// Sets the minimum inter-request delay.
    #[must_use]
    pub fn with_min_request_delay(mut self, seconds: f64) -> Self {
        self.min_request_delay_seconds = seconds;
        self
    }

    /// Adds or replaces a request header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Gets the timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds.max(0.0))
    }

    /// Gets the minimum inter-request spacing as a [`Duration`].
    #[must_use]
    pub fn min_request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.min_request_delay_seconds.max(0.0))
    }

    /// Delay before the retry following `attempt` (1-based).
    ///
    /// Linear backoff: attempt 1 waits 1x the base delay, attempt 2 waits 2x.
    #[must_use]
    pub fn retry_delay(&self, attempt: usize) -> Duration {
        Duration::from_secs_f64(self.base_retry_delay_seconds.max(0.0) * attempt as f64)
    }

    /// Whether a status code counts as transient.
    #[must_use]
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}

/// CSS selectors for movie detail pages (markup fallback path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailSelectors {
    /// Movie title.
    pub title: String,
    /// Release year text.
    pub year: String,
    /// Aggregate rating text.
    pub rating: String,
    /// Runtime display string.
    pub runtime: String,
    /// Genre names (multi-valued).
    pub genres: String,
    /// Director name.
    pub director: String,
    /// Cast names (multi-valued).
    pub cast: String,
    /// Plot summary.
    pub plot: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            title: "h1[data-testid='hero__pageTitle'] span.hero__primary-text".to_string(),
            year: "a[href*='/releaseinfo'] span".to_string(),
            rating: "div[data-testid='hero-rating-bar__aggregate-rating'] span".to_string(),
            runtime: "li[data-testid='title-techspec_runtime'] div".to_string(),
            genres: "div[data-testid='genres'] a span".to_string(),
            director: "div[data-testid='title-pc-principal-credit'] li a[href*='/name/']"
                .to_string(),
            cast: "div[data-testid='title-cast-item'] a[data-testid='title-cast-item__actor']"
                .to_string(),
            plot: "p[data-testid='plot'] span[data-testid='plot-xl']".to_string(),
        }
    }
}

/// CSS selectors for search result pages (markup fallback path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSelectors {
    /// One element per search result.
    pub results: String,
    /// Title link within a result element.
    pub title_link: String,
    /// Year text within a result element.
    pub year: String,
}

impl Default for SearchSelectors {
    fn default() -> Self {
        Self {
            results: "section[data-testid='find-results-section'] ul li".to_string(),
            title_link: "a[href*='/title/']".to_string(),
            year: "span[data-testid='find-result-year']".to_string(),
        }
    }
}

/// Selector tables for the markup fallback path.
///
/// These track the remote site's presentation markup and are expected to
/// need updates when its layout changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Detail page selectors.
    #[serde(default)]
    pub detail: DetailSelectors,
    /// Search page selectors.
    #[serde(default)]
    pub search: SearchSelectors,
}

/// Field-validation bounds for movie records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum title length in characters.
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
    /// Maximum plot length in characters; longer plots are truncated.
    #[serde(default = "default_max_plot_length")]
    pub max_plot_length: usize,
    /// Minimum acceptable rating.
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,
    /// Maximum acceptable rating.
    #[serde(default = "default_max_rating")]
    pub max_rating: f64,
    /// Minimum acceptable release year.
    #[serde(default = "default_min_year")]
    pub min_year: i32,
    /// Maximum acceptable release year.
    #[serde(default = "default_max_year")]
    pub max_year: i32,
    /// Maximum number of cast names kept on a record.
    #[serde(default = "default_max_cast")]
    pub max_cast: usize,
}

fn default_max_title_length() -> usize {
    200
}

fn default_max_plot_length() -> usize {
    1000
}

fn default_min_rating() -> f64 {
    0.0
}

fn default_max_rating() -> f64 {
    10.0
}

fn default_min_year() -> i32 {
    1900
}

fn default_max_year() -> i32 {
    2030
}

fn default_max_cast() -> usize {
    5
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_title_length: default_max_title_length(),
            max_plot_length: default_max_plot_length(),
            min_rating: default_min_rating(),
            max_rating: default_max_rating(),
            min_year: default_min_year(),
            max_year: default_max_year(),
            max_cast: default_max_cast(),
        }
    }
}

/// Combined configuration for the movie scraper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Base URL of the remote site.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default number of search results when the caller does not specify.
    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,
    /// Fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Markup selector tables.
    #[serde(default)]
    pub selectors: SelectorConfig,
    /// Record validation bounds.
    #[serde(default)]
    pub validation: ValidationConfig,
}

fn default_base_url() -> String {
    "https://www.imdb.com".to_string()
}

fn default_search_limit() -> usize {
    5
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_search_limit: default_search_limit(),
            fetch: FetchConfig::default(),
            selectors: SelectorConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl ScraperConfig {
    /// Creates a new scraper configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the fetch configuration.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Builds the title-search URL for a query.
    #[must_use]
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/find/?q={}&s=tt&ttype=ft&ref_=fn_ft",
            self.base_url,
            urlencoding::encode(query.trim())
        )
    }

    /// Builds the detail URL for a title identifier.
    #[must_use]
    pub fn title_url(&self, imdb_id: &str) -> String {
        format!("{}/title/{}/", self.base_url, imdb_id)
    }
}
