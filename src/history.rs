//! Search history tracking with JSON file persistence.
//!
//! Queries are normalized (trimmed, lower-cased) before recording so
//! repeated searches for the same title aggregate into one entry.
//! Persistence is best-effort: a save failure is logged and the in-memory
//! state stays authoritative.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{iso_format, parse_iso};

/// Protocol for recording search outcomes.
pub trait SearchHistory: Send + Sync {
    /// Records one search attempt and whether it produced a movie.
    fn record_search(&self, query: &str, success: bool);
}

/// No-op implementation of [`SearchHistory`].
///
/// Used as the default when no history store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSearchHistory;

impl SearchHistory for NoOpSearchHistory {
    fn record_search(&self, _query: &str, _success: bool) {}
}

/// Aggregate state for one normalized query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    /// How many times the query has been searched.
    pub count: u64,
    /// ISO-8601 timestamp of the most recent search.
    pub last_searched: Option<String>,
    /// `"success"` or `"failed"` for the most recent search.
    pub last_result: Option<String>,
}

/// A query together with its aggregate state, as returned by listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    /// Normalized query text.
    pub query: String,
    /// Aggregate state.
    #[serde(flatten)]
    pub entry: HistoryEntry,
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// File-backed search history.
///
/// The whole map is rewritten on every mutation; entry volume is small
/// enough that this stays cheap.
#[derive(Debug)]
pub struct FileSearchHistory {
    path: PathBuf,
    entries: Mutex<HashMap<String, HistoryEntry>>,
}

impl FileSearchHistory {
    /// Opens (or starts) a history store at the given path.
    ///
    /// An unreadable or malformed file starts the store empty rather than
    /// failing; history is an auxiliary record, not source data.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn load(path: &Path) -> HashMap<String, HistoryEntry> {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring malformed history file");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        }
    }

    fn save(&self, entries: &HashMap<String, HistoryEntry>) {
        let serialized = match serde_json::to_string_pretty(entries) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(error = %e, "could not serialize search history");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, serialized) {
            warn!(path = %self.path.display(), error = %e, "could not save search history");
        }
    }

    /// Most-searched queries, busiest first; ties broken by recency.
    #[must_use]
    pub fn popular_searches(&self, limit: usize) -> Vec<HistoryRecord> {
        let entries = self.entries.lock();
        let mut records: Vec<(&String, &HistoryEntry)> = entries.iter().collect();
        records.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then_with(|| b.1.last_searched.cmp(&a.1.last_searched))
        });
        records
            .into_iter()
            .take(limit)
            .map(|(query, entry)| HistoryRecord {
                query: query.clone(),
                entry: entry.clone(),
            })
            .collect()
    }

    /// Most recently searched queries, newest first.
    #[must_use]
    pub fn recent_searches(&self, limit: usize) -> Vec<HistoryRecord> {
        let entries = self.entries.lock();
        let mut records: Vec<(&String, &HistoryEntry)> = entries
            .iter()
            .filter(|(_, entry)| entry.last_searched.is_some())
            .collect();
        records.sort_by(|a, b| b.1.last_searched.cmp(&a.1.last_searched));
        records
            .into_iter()
            .take(limit)
            .map(|(query, entry)| HistoryRecord {
                query: query.clone(),
                entry: entry.clone(),
            })
            .collect()
    }

    /// Whether a query has been recorded.
    #[must_use]
    pub fn contains(&self, query: &str) -> bool {
        self.entries.lock().contains_key(&normalize(query))
    }

    /// Aggregate state for one query, if recorded.
    #[must_use]
    pub fn stats(&self, query: &str) -> Option<HistoryEntry> {
        self.entries.lock().get(&normalize(query)).cloned()
    }

    /// Removes entries last searched more than `days` days ago.
    ///
    /// Returns the number of entries removed. Entries with unparseable
    /// timestamps are kept.
    pub fn cleanup_older_than(&self, days: i64) -> usize {
        let cutoff = Utc::now() - Duration::days(days);
        let mut entries = self.entries.lock();
        let before = entries.len();

        entries.retain(|_, entry| {
            entry
                .last_searched
                .as_deref()
                .and_then(|text| parse_iso(text).ok())
                .map_or(true, |last: DateTime<Utc>| last >= cutoff)
        });

        let removed = before - entries.len();
        if removed > 0 {
            self.save(&entries);
        }
        removed
    }

    /// Total searches across all queries.
    #[must_use]
    pub fn total_searches(&self) -> u64 {
        self.entries.lock().values().map(|entry| entry.count).sum()
    }

    /// Number of distinct queries recorded.
    #[must_use]
    pub fn unique_queries(&self) -> usize {
        self.entries.lock().len()
    }

    /// Drops all entries and deletes the backing file.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "could not delete history file");
            }
        }
    }
}

impl SearchHistory for FileSearchHistory {
    fn record_search(&self, query: &str, success: bool) {
        let normalized = normalize(query);
        let mut entries = self.entries.lock();

        let entry = entries.entry(normalized).or_default();
        entry.count += 1;
        entry.last_searched = Some(iso_format(&Utc::now()));
        entry.last_result = Some(if success { "success" } else { "failed" }.to_string());

        self.save(&entries);
    }
}
