//! Data models for search candidates and validated movie records.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::ValidationConfig;
use crate::errors::{ScrapeError, ValidationError};

/// Marker appended to truncated plot summaries.
const ELLIPSIS: &str = "...";

/// Formats a timestamp as the exchange-format ISO-8601 string.
///
/// Microsecond precision with an explicit UTC offset, matching the format
/// records are persisted and transmitted with.
#[must_use]
pub fn iso_format(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Parses an exchange-format ISO-8601 timestamp back into UTC.
pub fn parse_iso(text: &str) -> Result<DateTime<Utc>, ScrapeError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScrapeError::Exchange(format!("invalid timestamp '{text}': {e}")))
}

/// Current UTC time truncated to the precision the exchange format carries.
fn now_truncated() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A candidate match from a search results page.
///
/// Produced only by the extractor during search parsing; consumed by the
/// disambiguator. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchCandidate {
    /// Candidate title.
    pub title: String,
    /// Release year when one could be derived.
    pub year: Option<i32>,
    /// External identifier (e.g. `tt1375666`).
    pub imdb_id: Option<String>,
    /// Canonical detail-page URL.
    pub url: Option<String>,
    /// Match quality against the query, in `[0.0, 1.0]`.
    pub relevance_score: f64,
}

impl SearchCandidate {
    /// Creates a candidate with only a title and score.
    #[must_use]
    pub fn new(title: impl Into<String>, relevance_score: f64) -> Self {
        Self {
            title: title.into(),
            year: None,
            imdb_id: None,
            url: None,
            relevance_score,
        }
    }

    /// Sets the release year.
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Sets the external identifier.
    #[must_use]
    pub fn with_imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        self.imdb_id = Some(imdb_id.into());
        self
    }

    /// Sets the canonical URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Converts to the flat exchange representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("title".to_string(), serde_json::json!(self.title));
        dict.insert("year".to_string(), serde_json::json!(self.year));
        dict.insert("imdb_id".to_string(), serde_json::json!(self.imdb_id));
        dict.insert("url".to_string(), serde_json::json!(self.url));
        dict.insert(
            "relevance_score".to_string(),
            serde_json::json!(self.relevance_score),
        );
        dict
    }
}

/// A validated movie record.
///
/// Constructed only through [`MovieBuilder`]; a value of this type always
/// satisfies the field constraints. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    /// Movie title.
    pub title: String,
    /// Release year.
    pub year: Option<i32>,
    /// Aggregate rating out of 10.
    pub rating: Option<f64>,
    /// Runtime display string (e.g. "2h 28m").
    pub runtime: Option<String>,
    /// Genre names in document order.
    pub genres: Vec<String>,
    /// Director name.
    pub director: Option<String>,
    /// Cast names in document order, capped at construction.
    pub cast: Vec<String>,
    /// Plot summary, truncated at construction when over the limit.
    pub plot: Option<String>,
    /// External identifier.
    pub imdb_id: Option<String>,
    /// Canonical detail-page URL.
    pub url: Option<String>,
    /// When the record was scraped.
    pub scraped_at: DateTime<Utc>,
}

impl MovieRecord {
    /// Converts to the flat exchange representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("title".to_string(), serde_json::json!(self.title));
        dict.insert("year".to_string(), serde_json::json!(self.year));
        dict.insert("rating".to_string(), serde_json::json!(self.rating));
        dict.insert("runtime".to_string(), serde_json::json!(self.runtime));
        dict.insert("genres".to_string(), serde_json::json!(self.genres));
        dict.insert("director".to_string(), serde_json::json!(self.director));
        dict.insert("cast".to_string(), serde_json::json!(self.cast));
        dict.insert("plot".to_string(), serde_json::json!(self.plot));
        dict.insert("imdb_id".to_string(), serde_json::json!(self.imdb_id));
        dict.insert("url".to_string(), serde_json::json!(self.url));
        dict.insert(
            "scraped_at".to_string(),
            serde_json::json!(iso_format(&self.scraped_at)),
        );
        dict
    }

    /// Reconstructs a record from the exchange representation.
    ///
    /// Inverts [`Self::to_dict`] exactly; the same validation applies, so a
    /// map carrying out-of-range fields is rejected.
    pub fn from_dict(dict: &HashMap<String, serde_json::Value>) -> Result<Self, ScrapeError> {
        let title = dict
            .get("title")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ScrapeError::Exchange("missing title".to_string()))?;

        let mut builder = MovieBuilder::new(title)
            .year(get_i32(dict, "year"))
            .rating(dict.get("rating").and_then(serde_json::Value::as_f64))
            .runtime(get_string(dict, "runtime"))
            .genres(get_string_list(dict, "genres"))
            .director(get_string(dict, "director"))
            .cast(get_string_list(dict, "cast"))
            .plot(get_string(dict, "plot"));

        if let Some(imdb_id) = get_string(dict, "imdb_id") {
            builder = builder.imdb_id(imdb_id);
        }
        if let Some(url) = get_string(dict, "url") {
            builder = builder.url(url);
        }
        if let Some(scraped_at) = get_string(dict, "scraped_at") {
            builder = builder.scraped_at(parse_iso(&scraped_at)?);
        }

        Ok(builder.build()?)
    }
}

fn get_string(dict: &HashMap<String, serde_json::Value>, key: &str) -> Option<String> {
    dict.get(key)
        .and_then(serde_json::Value::as_str)
        .map(String::from)
}

fn get_i32(dict: &HashMap<String, serde_json::Value>, key: &str) -> Option<i32> {
    dict.get(key)
        .and_then(serde_json::Value::as_i64)
        .map(|v| v as i32)
}

fn get_string_list(dict: &HashMap<String, serde_json::Value>, key: &str) -> Vec<String> {
    dict.get(key)
        .and_then(serde_json::Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Assembles raw extracted fields into a validated [`MovieRecord`].
///
/// `build` fails with a [`ValidationError`] when the title is empty or too
/// long, the rating is out of range, or the year is out of range. An
/// over-long plot is truncated rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct MovieBuilder {
    title: String,
    year: Option<i32>,
    rating: Option<f64>,
    runtime: Option<String>,
    genres: Vec<String>,
    director: Option<String>,
    cast: Vec<String>,
    plot: Option<String>,
    imdb_id: Option<String>,
    url: Option<String>,
    scraped_at: Option<DateTime<Utc>>,
}

impl MovieBuilder {
    /// Starts a builder with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the release year.
    #[must_use]
    pub fn year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    /// Sets the rating.
    #[must_use]
    pub fn rating(mut self, rating: Option<f64>) -> Self {
        self.rating = rating;
        self
    }

    /// Sets the runtime display string.
    #[must_use]
    pub fn runtime(mut self, runtime: Option<String>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Sets the genre list.
    #[must_use]
    pub fn genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }

    /// Sets the director name.
    #[must_use]
    pub fn director(mut self, director: Option<String>) -> Self {
        self.director = director;
        self
    }

    /// Sets the cast list.
    #[must_use]
    pub fn cast(mut self, cast: Vec<String>) -> Self {
        self.cast = cast;
        self
    }

    /// Sets the plot summary.
    #[must_use]
    pub fn plot(mut self, plot: Option<String>) -> Self {
        self.plot = plot;
        self
    }

    /// Sets the external identifier.
    #[must_use]
    pub fn imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        self.imdb_id = Some(imdb_id.into());
        self
    }

    /// Sets the canonical URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the scrape timestamp; defaults to now when omitted.
    #[must_use]
    pub fn scraped_at(mut self, scraped_at: DateTime<Utc>) -> Self {
        self.scraped_at = Some(scraped_at);
        self
    }

    /// Validates and builds the record with default bounds.
    pub fn build(self) -> Result<MovieRecord, ValidationError> {
        self.build_with(&ValidationConfig::default())
    }

    /// Validates and builds the record with the given bounds.
    pub fn build_with(self, limits: &ValidationConfig) -> Result<MovieRecord, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let title_length = self.title.chars().count();
        if title_length > limits.max_title_length {
            return Err(ValidationError::TitleTooLong {
                length: title_length,
                max: limits.max_title_length,
            });
        }

        if let Some(rating) = self.rating {
            if !(limits.min_rating..=limits.max_rating).contains(&rating) {
                return Err(ValidationError::RatingOutOfRange { rating });
            }
        }

        if let Some(year) = self.year {
            if !(limits.min_year..=limits.max_year).contains(&year) {
                return Err(ValidationError::YearOutOfRange { year });
            }
        }

        let plot = self.plot.map(|plot| {
            if plot.chars().count() > limits.max_plot_length {
                let kept: String = plot
                    .chars()
                    .take(limits.max_plot_length - ELLIPSIS.len())
                    .collect();
                format!("{kept}{ELLIPSIS}")
            } else {
                plot
            }
        });

        let mut cast = self.cast;
        cast.truncate(limits.max_cast);

        Ok(MovieRecord {
            title: self.title,
            year: self.year,
            rating: self.rating,
            runtime: self.runtime,
            genres: self.genres,
            director: self.director,
            cast,
            plot,
            imdb_id: self.imdb_id,
            url: self.url,
            scraped_at: self.scraped_at.unwrap_or_else(now_truncated),
        })
    }
}
