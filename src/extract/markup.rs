//! Markup extraction via CSS selectors.
//!
//! Fallback path for pages without usable embedded JSON. Every selector
//! comes from [`SelectorConfig`](crate::config::SelectorConfig); a selector
//! that fails to parse or matches nothing yields `None` for its field
//! rather than an error.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::ScraperConfig;
use crate::models::{MovieBuilder, SearchCandidate};

/// Cap for multi-valued fields without an explicit limit.
const MULTI_VALUE_LIMIT: usize = 5;

/// Text of the first element matching `selector`, trimmed.
fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Texts of up to `limit` elements matching `selector`.
fn select_all_text(document: &Html, selector: &str, limit: usize) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .take(limit)
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolves an href against the configured base URL.
fn resolve_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), href.trim_start_matches('/'))
    }
}

/// Pulls a `ttNNNNNNN` identifier out of a detail-page URL.
fn imdb_id_from_url(url: &str) -> Option<String> {
    let re = Regex::new(r"/title/(tt\d+)").ok()?;
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Leading number of a rating display string such as `8.8/10`.
fn rating_from_text(text: &str) -> Option<f64> {
    text.split('/').next()?.trim().parse().ok()
}

/// Extracts search candidates from the rendered result list.
pub(super) fn search_candidates(
    document: &Html,
    query: &str,
    limit: usize,
    config: &ScraperConfig,
) -> Vec<SearchCandidate> {
    let selectors = &config.selectors.search;
    let Ok(results) = Selector::parse(&selectors.results) else {
        return Vec::new();
    };
    let Ok(title_link) = Selector::parse(&selectors.title_link) else {
        return Vec::new();
    };
    let year_selector = Selector::parse(&selectors.year).ok();

    document
        .select(&results)
        .filter_map(|element| {
            let link = element.select(&title_link).next()?;
            let title = element_text(link);
            if title.is_empty() {
                return None;
            }

            let mut candidate =
                SearchCandidate::new(&title, super::relevance_score(query, &title));

            if let Some(href) = link.value().attr("href") {
                let url = resolve_url(&config.base_url, href);
                if let Some(id) = imdb_id_from_url(&url) {
                    candidate = candidate.with_imdb_id(id);
                }
                candidate = candidate.with_url(url);
            }

            if let Some(year) = year_selector
                .as_ref()
                .and_then(|s| element.select(s).next())
                .and_then(|e| super::year_from_text(&element_text(e)))
            {
                candidate = candidate.with_year(year);
            }

            Some(candidate)
        })
        .take(limit)
        .collect()
}

/// Extracts detail fields from the rendered page.
///
/// Returns `None` when the title selector matches nothing.
pub(super) fn detail(
    document: &Html,
    imdb_id: &str,
    config: &ScraperConfig,
) -> Option<MovieBuilder> {
    let selectors = &config.selectors.detail;

    let title = select_text(document, &selectors.title)?;

    Some(
        MovieBuilder::new(title)
            .year(select_text(document, &selectors.year)
                .and_then(|text| super::year_from_text(&text)))
            .rating(select_text(document, &selectors.rating)
                .and_then(|text| rating_from_text(&text)))
            .runtime(select_text(document, &selectors.runtime))
            .genres(select_all_text(document, &selectors.genres, MULTI_VALUE_LIMIT))
            .director(select_text(document, &selectors.director))
            .cast(select_all_text(document, &selectors.cast, config.validation.max_cast))
            .plot(select_text(document, &selectors.plot))
            .imdb_id(imdb_id)
            .url(config.title_url(imdb_id)),
    )
}
