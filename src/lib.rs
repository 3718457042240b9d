//! # Cinescrape
//!
//! Resilient movie-data extraction from IMDb.
//!
//! Given a free-text movie title, cinescrape issues rate-limited, retrying
//! HTTP requests against the search endpoint, disambiguates candidate
//! matches, fetches the detail page, and extracts a validated record from
//! content that may be encoded either as embedded JSON or as styled markup.
//!
//! - **Dual-path extraction**: embedded `application/json` script blocks are
//!   probed first; fixed CSS selectors against the rendered markup are the
//!   fallback when no usable structured data is present
//! - **Polite fetching**: a shared minimum inter-request delay and bounded
//!   retries with linear backoff, surfaced as typed outcomes rather than
//!   errors
//! - **Validated records**: field constraints are applied at construction;
//!   an invalid record is a value-level failure, never a panic
//! - **Injected observability**: structured event callbacks instead of
//!   process-wide logging side effects
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use cinescrape::prelude::*;
//!
//! let scraper = MovieScraper::new(ScraperConfig::default())?;
//! if let Some(movie) = scraper.search_and_get_movie("Inception").await {
//!     println!("{} ({:?})", movie.title, movie.year);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod events;
pub mod extract;
pub mod fetch;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod rank;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{FetchConfig, ScraperConfig, SelectorConfig, ValidationConfig};
    pub use crate::errors::{FetchFailure, ScrapeError, ValidationError};
    pub use crate::events::{NoOpScrapeObserver, ScrapeObserver};
    pub use crate::fetch::{FetchOutcome, FetchedPage, Fetcher, HttpFetcher};
    pub use crate::history::{FileSearchHistory, NoOpSearchHistory, SearchHistory};
    pub use crate::models::{MovieBuilder, MovieRecord, SearchCandidate};
    pub use crate::pipeline::MovieScraper;
    pub use crate::rank::best_match;
}
