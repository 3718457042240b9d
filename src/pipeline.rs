//! High-level scrape flows: search, detail lookup, and the combined
//! search-and-fetch operation.
//!
//! Failures inside a flow degrade to empty results rather than errors:
//! the fetcher reports its terminal failure, the pipeline logs it, and
//! the caller sees "nothing found". Only setup problems (client
//! construction) surface as [`ScrapeError`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::errors::ScrapeError;
use crate::extract;
use crate::fetch::{FetchOutcome, Fetcher, HttpFetcher};
use crate::history::{NoOpSearchHistory, SearchHistory};
use crate::models::{MovieRecord, SearchCandidate};
use crate::rank;

/// The movie scraper pipeline.
///
/// Owns a fetcher, an optional history store, and the configuration.
/// Cheap to share: wrap in an [`Arc`] to use from several tasks; the
/// fetcher's pacing is already shared across clones of that `Arc`.
pub struct MovieScraper {
    fetcher: Arc<dyn Fetcher>,
    history: Arc<dyn SearchHistory>,
    config: ScraperConfig,
}

impl std::fmt::Debug for MovieScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovieScraper")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MovieScraper {
    /// Creates a scraper with an HTTP fetcher built from the configuration.
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        let fetcher = HttpFetcher::new(config.fetch.clone())?;
        Ok(Self::with_fetcher(Arc::new(fetcher), config))
    }

    /// Creates a scraper around an existing fetcher.
    #[must_use]
    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, config: ScraperConfig) -> Self {
        Self {
            fetcher,
            history: Arc::new(NoOpSearchHistory),
            config,
        }
    }

    /// Sets the history store that records search outcomes.
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn SearchHistory>) -> Self {
        self.history = history;
        self
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Searches for movies matching a query.
    ///
    /// Returns candidates sorted by relevance, at most `max_results` of
    /// them. A blank query or a failed fetch yields an empty list.
    pub async fn search_movies(&self, query: &str, max_results: usize) -> Vec<SearchCandidate> {
        if query.trim().is_empty() {
            debug!("ignoring blank search query");
            return Vec::new();
        }

        let url = self.config.search_url(query);
        info!(query, url, "searching for movies");

        let page = match self.fetcher.fetch(&url).await {
            FetchOutcome::Page(page) => page,
            FetchOutcome::Failed(failure) => {
                warn!(query, error = %failure, "search fetch failed");
                return Vec::new();
            }
        };

        let candidates = extract::search_candidates(&page.html, query, max_results, &self.config);
        info!(query, count = candidates.len(), "search complete");
        candidates
    }

    /// Fetches and extracts a movie record by its identifier.
    ///
    /// Returns `None` when the identifier is malformed, the fetch fails,
    /// extraction finds no usable fields, or the extracted record fails
    /// validation.
    pub async fn get_movie_details(&self, imdb_id: &str) -> Option<MovieRecord> {
        if imdb_id.is_empty() || !imdb_id.starts_with("tt") {
            warn!(imdb_id, "rejecting malformed title identifier");
            return None;
        }

        let url = self.config.title_url(imdb_id);
        info!(imdb_id, url, "fetching movie details");

        let page = match self.fetcher.fetch(&url).await {
            FetchOutcome::Page(page) => page,
            FetchOutcome::Failed(failure) => {
                warn!(imdb_id, error = %failure, "detail fetch failed");
                return None;
            }
        };

        let builder = extract::detail(&page.html, imdb_id, &self.config)?;
        match builder.build_with(&self.config.validation) {
            Ok(movie) => {
                info!(imdb_id, title = %movie.title, "extracted movie record");
                Some(movie)
            }
            Err(e) => {
                warn!(imdb_id, error = %e, "extracted record failed validation");
                None
            }
        }
    }

    /// Searches for a movie and fetches full details for the best match.
    ///
    /// Records the outcome in the history store: failed when the search
    /// produced no identified candidate, otherwise success iff a validated
    /// record came back.
    pub async fn search_and_get_movie(&self, query: &str) -> Option<MovieRecord> {
        let candidates = self.search_movies(query, 1).await;

        let Some(imdb_id) = rank::best_match(&candidates)
            .and_then(|best| best.imdb_id.as_deref())
            .filter(|id| !id.is_empty())
            .map(String::from)
        else {
            self.history.record_search(query, false);
            return None;
        };

        let movie = self.get_movie_details(&imdb_id).await;
        self.history.record_search(query, movie.is_some());
        movie
    }
}
