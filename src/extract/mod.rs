//! Dual-path extraction engine.
//!
//! Two strategies run in strict order. The structured path scans embedded
//! `application/json` script blocks and probes nested optional paths; the
//! markup path applies a fixed selector table against the rendered tree.
//! Each strategy is a pure function from document to an optional result;
//! the first to produce anything wins, and parse absence is absorbed
//! locally rather than propagated as an error.

mod markup;
mod structured;

use regex::Regex;
use scraper::Html;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::models::{MovieBuilder, SearchCandidate};

const YEAR_PATTERN: &str = r"\b(19|20)\d{2}\b";

/// Extracts the first plausible release year (19xx/20xx) from free text.
///
/// Structured date fields are unreliable on the remote site; release
/// descriptors like "2010 film" or "2008-2013 TV series" are scanned for
/// the first matching token instead.
#[must_use]
pub fn year_from_text(text: &str) -> Option<i32> {
    let re = Regex::new(YEAR_PATTERN).ok()?;
    re.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Relevance of a candidate title against a query.
///
/// Deliberately coarse: exactly 1.0 when the lower-cased query is a
/// substring of the lower-cased title, else exactly 0.5.
#[must_use]
pub fn relevance_score(query: &str, title: &str) -> f64 {
    if title.to_lowercase().contains(&query.to_lowercase()) {
        1.0
    } else {
        0.5
    }
}

/// Extracts up to `limit` search candidates from a results page.
///
/// Runs the structured path first and the markup path only when the
/// structured path yields nothing. The result is sorted by descending
/// relevance; ties keep document order.
#[must_use]
pub fn search_candidates(
    html: &str,
    query: &str,
    limit: usize,
    config: &ScraperConfig,
) -> Vec<SearchCandidate> {
    let document = Html::parse_document(html);

    let mut candidates = structured::search_candidates(&document, query, limit, config);
    if candidates.is_empty() {
        debug!(query, "structured search extraction yielded nothing, trying markup selectors");
        candidates = markup::search_candidates(&document, query, limit, config);
    }

    // Vec::sort_by is stable, so equal scores keep their document order.
    candidates.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

/// Extracts detail fields from a title page, ready for validation.
///
/// `None` means "not found": neither path produced a usable title.
#[must_use]
pub fn detail(html: &str, imdb_id: &str, config: &ScraperConfig) -> Option<MovieBuilder> {
    let document = Html::parse_document(html);

    structured::detail(&document, imdb_id, config).or_else(|| {
        debug!(imdb_id, "structured detail extraction failed, trying markup selectors");
        markup::detail(&document, imdb_id, config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_year_from_text_picks_first_token() {
        assert_eq!(year_from_text("2010 film"), Some(2010));
        assert_eq!(year_from_text("released 1994, remade 2011"), Some(1994));
        assert_eq!(year_from_text("19xx placeholder 2001"), Some(2001));
    }

    #[test]
    fn test_year_from_text_absent() {
        assert_eq!(year_from_text("no year here"), None);
        assert_eq!(year_from_text("1899"), None);
        assert_eq!(year_from_text("21000 leagues"), None);
    }

    #[test]
    fn test_relevance_score_substring() {
        assert_eq!(relevance_score("inception", "Inception"), 1.0);
        assert_eq!(relevance_score("Dark Knight", "The Dark Knight Rises"), 1.0);
        assert_eq!(relevance_score("Batman", "The Dark Knight"), 0.5);
    }

    #[test]
    fn test_search_sorted_by_relevance_descending() {
        let html = fixtures::search_page(&[
            ("Some Other Film", "2001", "tt0000001"),
            ("Heat", "1995", "tt0113277"),
            ("Another Film", "2002", "tt0000002"),
        ]);
        let config = ScraperConfig::default();

        let candidates = search_candidates(&html, "heat", 5, &config);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].title, "Heat");
        assert_eq!(candidates[0].relevance_score, 1.0);
        // Ties keep document order.
        assert_eq!(candidates[1].title, "Some Other Film");
        assert_eq!(candidates[2].title, "Another Film");
    }

    #[test]
    fn test_search_respects_limit() {
        let entries: Vec<(String, String, String)> = (0..10)
            .map(|i| (format!("Film {i}"), "2000".to_string(), format!("tt{i:07}")))
            .collect();
        let borrowed: Vec<(&str, &str, &str)> = entries
            .iter()
            .map(|(a, b, c)| (a.as_str(), b.as_str(), c.as_str()))
            .collect();
        let html = fixtures::search_page(&borrowed);

        let candidates = search_candidates(&html, "film", 3, &ScraperConfig::default());
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_search_falls_back_to_markup() {
        let html = r#"
            <html><body>
              <section data-testid="find-results-section"><ul>
                <li>
                  <a href="/title/tt0133093/">The Matrix</a>
                  <span data-testid="find-result-year">1999</span>
                </li>
              </ul></section>
            </body></html>
        "#;

        let candidates = search_candidates(html, "matrix", 5, &ScraperConfig::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "The Matrix");
        assert_eq!(candidates[0].year, Some(1999));
        assert_eq!(candidates[0].imdb_id.as_deref(), Some("tt0133093"));
    }

    #[test]
    fn test_detail_absent_on_empty_document() {
        let config = ScraperConfig::default();
        assert!(detail("<html><body></body></html>", "tt0000000", &config).is_none());
    }
}
