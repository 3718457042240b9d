//! Structured extraction from embedded JSON script blocks.
//!
//! Modern pages of the remote site ship their data as a serialized state
//! tree inside `<script type="application/json">` elements. Every path
//! probed here is optional: a missing key yields `None` for that field,
//! never an error, so layout drift degrades output instead of breaking it.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::config::ScraperConfig;
use crate::models::{MovieBuilder, SearchCandidate};

/// Parses every embedded JSON script block in document order.
fn json_blocks(document: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/json"]"#) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| {
            let text: String = element.text().collect();
            serde_json::from_str(&text).ok()
        })
        .collect()
}

/// Non-empty trimmed string at a pointer, if present.
fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Extracts search candidates from the first block carrying a result list.
pub(super) fn search_candidates(
    document: &Html,
    query: &str,
    limit: usize,
    config: &ScraperConfig,
) -> Vec<SearchCandidate> {
    for block in json_blocks(document) {
        let Some(results) = block
            .pointer("/props/pageProps/titleResults/results")
            .and_then(Value::as_array)
        else {
            continue;
        };

        return results
            .iter()
            .filter_map(|result| {
                let title = string_at(result, "/titleNameText")?;
                let mut candidate =
                    SearchCandidate::new(&title, super::relevance_score(query, &title));

                if let Some(year) = string_at(result, "/titleReleaseText")
                    .and_then(|text| super::year_from_text(&text))
                {
                    candidate = candidate.with_year(year);
                }
                if let Some(id) = string_at(result, "/id") {
                    candidate = candidate
                        .with_url(config.title_url(&id))
                        .with_imdb_id(id);
                }
                Some(candidate)
            })
            .take(limit)
            .collect();
    }
    Vec::new()
}

/// Director from the `crewV2` grouping list.
fn director_from_crew(page_props: &Value) -> Option<String> {
    let crew = page_props
        .pointer("/mainColumnData/crewV2")
        .and_then(Value::as_array)?;

    crew.iter().find_map(|group| {
        if string_at(group, "/grouping/text")?.as_str() != "Director" {
            return None;
        }
        string_at(group, "/credits/0/name/nameText/text")
    })
}

/// Director from the principal-credits categories.
fn director_from_principal_credits(page_props: &Value) -> Option<String> {
    let categories = page_props
        .pointer("/aboveTheFoldData/principalCredits")
        .and_then(Value::as_array)?;

    categories.iter().find_map(|category| {
        if string_at(category, "/category/text")?.as_str() != "Director" {
            return None;
        }
        string_at(category, "/credits/0/name/nameText/text")
    })
}

/// Director from the dedicated directors list.
fn director_from_directors_page(page_props: &Value) -> Option<String> {
    string_at(
        page_props,
        "/aboveTheFoldData/directorsPageTitle/0/name/nameText/text",
    )
}

/// Extracts detail fields from the first block carrying page data.
///
/// Returns `None` when no block carries a usable title; the caller then
/// falls through to the markup path.
pub(super) fn detail(
    document: &Html,
    imdb_id: &str,
    config: &ScraperConfig,
) -> Option<MovieBuilder> {
    for block in json_blocks(document) {
        let Some(page_props) = block
            .pointer("/props/pageProps")
            .filter(|props| props.as_object().is_some_and(|map| !map.is_empty()))
        else {
            continue;
        };
        let null = Value::Null;
        let fold = page_props.pointer("/aboveTheFoldData").unwrap_or(&null);

        let Some(title) = string_at(fold, "/titleText/text") else {
            continue;
        };

        let genres = fold
            .pointer("/genres/genres")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|genre| string_at(genre, "/text"))
                    .collect()
            })
            .unwrap_or_default();

        let director = director_from_crew(page_props)
            .or_else(|| director_from_principal_credits(page_props))
            .or_else(|| director_from_directors_page(page_props));

        let cast = fold
            .pointer("/castPageTitle/edges")
            .and_then(Value::as_array)
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(|edge| string_at(edge, "/node/name/nameText/text"))
                    .take(config.validation.max_cast)
                    .collect()
            })
            .unwrap_or_default();

        return Some(
            MovieBuilder::new(title)
                .year(fold.pointer("/releaseYear/year").and_then(Value::as_i64).map(|y| y as i32))
                .rating(fold.pointer("/ratingsSummary/aggregateRating").and_then(Value::as_f64))
                .runtime(string_at(fold, "/runtime/displayableProperty/value/plainText"))
                .genres(genres)
                .director(director)
                .cast(cast)
                .plot(string_at(fold, "/plot/plotText/plainText"))
                .imdb_id(imdb_id)
                .url(config.title_url(imdb_id)),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    fn inception_page_props() -> serde_json::Value {
        serde_json::json!({
            "aboveTheFoldData": {
                "titleText": { "text": "Inception" },
                "releaseYear": { "year": 2010 },
                "ratingsSummary": { "aggregateRating": 8.8 },
                "runtime": {
                    "displayableProperty": { "value": { "plainText": "2h 28m" } }
                },
                "genres": {
                    "genres": [{ "text": "Action" }, { "text": "Sci-Fi" }]
                },
                "plot": { "plotText": { "plainText": "A thief enters dreams." } },
                "castPageTitle": {
                    "edges": [
                        { "node": { "name": { "nameText": { "text": "Leonardo DiCaprio" } } } },
                        { "node": { "name": { "nameText": { "text": "Joseph Gordon-Levitt" } } } }
                    ]
                }
            },
            "mainColumnData": {
                "crewV2": [{
                    "grouping": { "text": "Director" },
                    "credits": [{ "name": { "nameText": { "text": "Christopher Nolan" } } }]
                }]
            }
        })
    }

    #[test]
    fn test_detail_extracts_all_fields() {
        let html = fixtures::detail_page(inception_page_props());
        let config = ScraperConfig::default();

        let movie = detail(&parse(&html), "tt1375666", &config)
            .and_then(|b| b.build().ok())
            .unwrap();

        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.year, Some(2010));
        assert_eq!(movie.rating, Some(8.8));
        assert_eq!(movie.runtime.as_deref(), Some("2h 28m"));
        assert_eq!(movie.genres, vec!["Action", "Sci-Fi"]);
        assert_eq!(movie.director.as_deref(), Some("Christopher Nolan"));
        assert_eq!(movie.cast.len(), 2);
        assert_eq!(movie.plot.as_deref(), Some("A thief enters dreams."));
        assert_eq!(movie.imdb_id.as_deref(), Some("tt1375666"));
        assert_eq!(
            movie.url.as_deref(),
            Some("https://www.imdb.com/title/tt1375666/")
        );
    }

    #[test]
    fn test_detail_requires_title() {
        let mut props = inception_page_props();
        props["aboveTheFoldData"]["titleText"] = serde_json::json!({ "text": "  " });
        let html = fixtures::detail_page(props);

        assert!(detail(&parse(&html), "tt1375666", &ScraperConfig::default()).is_none());
    }

    #[test]
    fn test_detail_tolerates_missing_optional_fields() {
        let props = serde_json::json!({
            "aboveTheFoldData": { "titleText": { "text": "Bare Bones" } }
        });
        let html = fixtures::detail_page(props);

        let movie = detail(&parse(&html), "tt0000001", &ScraperConfig::default())
            .and_then(|b| b.build().ok())
            .unwrap();

        assert_eq!(movie.title, "Bare Bones");
        assert_eq!(movie.year, None);
        assert_eq!(movie.rating, None);
        assert!(movie.genres.is_empty());
        assert!(movie.cast.is_empty());
    }

    #[test]
    fn test_director_fallback_chain() {
        let mut props = inception_page_props();
        props["mainColumnData"]["crewV2"] = serde_json::json!([{
            "grouping": { "text": "Writer" },
            "credits": [{ "name": { "nameText": { "text": "Jonathan Nolan" } } }]
        }]);
        props["aboveTheFoldData"]["principalCredits"] = serde_json::json!([{
            "category": { "text": "Director" },
            "credits": [{ "name": { "nameText": { "text": "Christopher Nolan" } } }]
        }]);
        let html = fixtures::detail_page(props.clone());

        let builder = detail(&parse(&html), "tt1375666", &ScraperConfig::default()).unwrap();
        let movie = builder.build().unwrap();
        assert_eq!(movie.director.as_deref(), Some("Christopher Nolan"));

        props["aboveTheFoldData"]["principalCredits"] = serde_json::json!([]);
        props["aboveTheFoldData"]["directorsPageTitle"] = serde_json::json!([{
            "name": { "nameText": { "text": "C. Nolan" } }
        }]);
        let html = fixtures::detail_page(props);
        let movie = detail(&parse(&html), "tt1375666", &ScraperConfig::default())
            .and_then(|b| b.build().ok())
            .unwrap();
        assert_eq!(movie.director.as_deref(), Some("C. Nolan"));
    }

    #[test]
    fn test_detail_caps_cast() {
        let edges: Vec<serde_json::Value> = (0..9)
            .map(|i| {
                serde_json::json!({
                    "node": { "name": { "nameText": { "text": format!("Actor {i}") } } }
                })
            })
            .collect();
        let mut props = inception_page_props();
        props["aboveTheFoldData"]["castPageTitle"]["edges"] = serde_json::json!(edges);
        let html = fixtures::detail_page(props);

        let movie = detail(&parse(&html), "tt1375666", &ScraperConfig::default())
            .and_then(|b| b.build().ok())
            .unwrap();
        assert_eq!(movie.cast.len(), 5);
    }

    #[test]
    fn test_search_candidates_extracted_in_document_order() {
        let html = fixtures::search_page(&[
            ("Inception", "2010", "tt1375666"),
            ("Inception: The Cobol Job", "2010", "tt1790736"),
        ]);
        let config = ScraperConfig::default();

        let candidates = search_candidates(&parse(&html), "inception", 5, &config);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Inception");
        assert_eq!(candidates[0].year, Some(2010));
        assert_eq!(candidates[0].imdb_id.as_deref(), Some("tt1375666"));
        assert_eq!(
            candidates[0].url.as_deref(),
            Some("https://www.imdb.com/title/tt1375666/")
        );
        assert_eq!(candidates[0].relevance_score, 1.0);
    }

    #[test]
    fn test_search_skips_entries_without_title() {
        let props = serde_json::json!({
            "titleResults": {
                "results": [
                    { "id": "tt0000001" },
                    { "titleNameText": "Heat", "titleReleaseText": "1995", "id": "tt0113277" }
                ]
            }
        });
        let html = fixtures::detail_page(props);

        let candidates = search_candidates(&parse(&html), "heat", 5, &ScraperConfig::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Heat");
    }

    #[test]
    fn test_malformed_json_block_skipped() {
        let html = r#"<html><head>
            <script type="application/json">{ not valid json</script>
        </head><body></body></html>"#;

        assert!(search_candidates(&parse(html), "x", 5, &ScraperConfig::default()).is_empty());
        assert!(detail(&parse(html), "tt0000001", &ScraperConfig::default()).is_none());
    }
}
