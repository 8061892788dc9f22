//! Diary entry storage
//!
//! The insight pipeline only ever sees the `EntryStore` capability. Two
//! persistent backends exist, mirroring where the journaling app keeps its
//! records:
//!
//! - `FileEntryStore`: one JSON file per entry in a directory (device)
//! - `KeyValueEntryStore`: a single key → record map (browser local storage)
//!
//! `MemoryEntryStore` holds raw records in memory for tests and embedding.
//!
//! Records are keyed `diary-YYYY-MM-DD-HHMMSSmmm.json`. A record that cannot
//! be read or parsed is skipped on its own; only failing to enumerate the
//! medium as a whole is an error.

mod fs;
mod kv;
mod memory;

pub use fs::FileEntryStore;
pub use kv::KeyValueEntryStore;
pub use memory::MemoryEntryStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::warn;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::models::{DiaryEntry, NewEntry};

/// Prefix every diary record key starts with
pub const ENTRY_KEY_PREFIX: &str = "diary-";

/// Suffix every diary record key ends with
pub const ENTRY_KEY_SUFFIX: &str = ".json";

/// Read/write access to persisted diary entries
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Enumerate all well-formed entries, sorted by date then key
    async fn list_entries(&self) -> Result<Vec<DiaryEntry>>;

    /// Persist a new entry dated today, returning its record key
    async fn save_entry(&self, entry: &NewEntry) -> Result<String>;

    /// Human-readable location of the store (for logging and `config`)
    fn describe(&self) -> String;
}

/// Open the store selected by configuration
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn EntryStore>> {
    let path = config.resolved_path()?;
    let store: Arc<dyn EntryStore> = match config.backend {
        StoreBackend::Files => Arc::new(FileEntryStore::new(path)),
        StoreBackend::KeyValue => Arc::new(KeyValueEntryStore::new(path)),
    };
    tracing::debug!(store = %store.describe(), "Opened entry store");
    Ok(store)
}

/// Whether a key/file name names a diary record
pub fn is_entry_key(key: &str) -> bool {
    key.starts_with(ENTRY_KEY_PREFIX) && key.ends_with(ENTRY_KEY_SUFFIX)
}

/// Build the record key for an entry written at `now`
pub fn entry_key(now: DateTime<Local>) -> String {
    format!(
        "{}{}-{}{}",
        ENTRY_KEY_PREFIX,
        now.format("%Y-%m-%d"),
        now.format("%H%M%S%3f"),
        ENTRY_KEY_SUFFIX
    )
}

/// Make `key` unique among existing keys by adding `_N` before the suffix
///
/// Two entries saved within the same millisecond would otherwise share a key.
pub(crate) fn unique_key(key: String, exists: impl Fn(&str) -> bool) -> String {
    if !exists(&key) {
        return key;
    }
    let stem = key.trim_end_matches(ENTRY_KEY_SUFFIX);
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ENTRY_KEY_SUFFIX);
        if !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Build the stored record for a new entry written at `now`
pub(crate) fn new_record(entry: &NewEntry, now: DateTime<Local>) -> Result<(String, String)> {
    entry.validate()?;
    let record = DiaryEntry {
        date: now.format("%Y-%m-%d").to_string(),
        response: entry.response.clone(),
        mood: entry.mood,
        tags: entry.tags.clone(),
        prompt: entry.prompt.clone(),
    };
    Ok((entry_key(now), serde_json::to_string(&record)?))
}

/// Sort position of a key: the base key, then its numeric `_N` counter
fn key_order(key: &str) -> (&str, u32) {
    let stem = key.strip_suffix(ENTRY_KEY_SUFFIX).unwrap_or(key);
    match stem.rsplit_once('_') {
        Some((base, n)) => match n.parse() {
            Ok(n) => (base, n),
            Err(_) => (stem, 0),
        },
        None => (stem, 0),
    }
}

/// Parse one stored record, or `None` if it should be skipped
pub(crate) fn parse_record(key: &str, content: &str) -> Option<DiaryEntry> {
    if content.trim().is_empty() {
        warn!(key = %key, "Skipping empty diary record");
        return None;
    }

    let entry: DiaryEntry = match serde_json::from_str(content) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(key = %key, error = %e, "Skipping malformed diary record");
            return None;
        }
    };

    if let Err(e) = entry.validate() {
        warn!(key = %key, error = %e, "Skipping invalid diary record");
        return None;
    }

    Some(entry)
}

/// Parse a batch of `(key, content)` records into a stable entry list
pub(crate) fn collect_entries(mut records: Vec<(String, String)>) -> Vec<DiaryEntry> {
    records.sort_by(|a, b| key_order(&a.0).cmp(&key_order(&b.0)));
    let mut entries: Vec<DiaryEntry> = records
        .iter()
        .filter(|(key, _)| is_entry_key(key))
        .filter_map(|(key, content)| parse_record(key, content))
        .collect();
    // Stable sort keeps key order within a day
    entries.sort_by(|a, b| a.date.cmp(&b.date));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unique_key_adds_counter() {
        let taken = ["diary-2024-01-01-120000000.json", "diary-2024-01-01-120000000_1.json"];
        let key = unique_key("diary-2024-01-01-120000000.json".into(), |k| taken.contains(&k));
        assert_eq!(key, "diary-2024-01-01-120000000_2.json");
        assert!(is_entry_key(&key));
        assert_eq!(unique_key("diary-x.json".into(), |_| false), "diary-x.json");
    }

    #[test]
    fn test_is_entry_key() {
        assert!(is_entry_key("diary-2024-01-01-120000000.json"));
        assert!(is_entry_key("diary-2024-01-01.json"));
        assert!(!is_entry_key("diary-2024-01-01.txt"));
        assert!(!is_entry_key("@last_diary_entry"));
        assert!(!is_entry_key("my-diary-2024.json"));
    }

    #[test]
    fn test_entry_key_format() {
        let now = Local
            .with_ymd_and_hms(2024, 3, 5, 7, 8, 9)
            .single()
            .unwrap();
        assert_eq!(entry_key(now), "diary-2024-03-05-070809000.json");
    }

    #[test]
    fn test_collect_entries_isolates_bad_records() {
        let records = vec![
            (
                "diary-2024-01-02-000000000.json".to_string(),
                r#"{"date":"2024-01-02","response":"b","mood":8,"tags":[]}"#.to_string(),
            ),
            ("diary-2024-01-03-000000000.json".to_string(), "{not json".to_string()),
            ("diary-2024-01-04-000000000.json".to_string(), String::new()),
            (
                "diary-2024-01-05-000000000.json".to_string(),
                r#"{"date":"2024-01-05","response":"c","mood":42}"#.to_string(),
            ),
            (
                "diary-2024-01-01-000000000.json".to_string(),
                r#"{"date":"2024-01-01","response":"a","mood":3,"tags":["school"]}"#.to_string(),
            ),
            ("notes.json".to_string(), r#"{"date":"2024-01-01"}"#.to_string()),
        ];

        let entries = collect_entries(records);
        let texts: Vec<&str> = entries.iter().map(|e| e.response.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_collect_entries_sorts_same_day_by_key() {
        let records = vec![
            (
                "diary-2024-01-01-180000000.json".to_string(),
                r#"{"date":"2024-01-01","response":"evening"}"#.to_string(),
            ),
            (
                "diary-2024-01-01-080000000.json".to_string(),
                r#"{"date":"2024-01-01","response":"morning"}"#.to_string(),
            ),
        ];
        let entries = collect_entries(records);
        assert_eq!(entries[0].response, "morning");
        assert_eq!(entries[1].response, "evening");
    }

    #[test]
    fn test_collect_entries_orders_same_millisecond_saves() {
        let base = "diary-2024-01-01-120000000.json".to_string();
        let taken: Vec<String> = (0..11)
            .scan(Vec::<String>::new(), |keys, _| {
                let key = unique_key(base.clone(), |k| keys.iter().any(|t| t == k));
                keys.push(key.clone());
                Some(key)
            })
            .collect();
        assert_eq!(taken[10], "diary-2024-01-01-120000000_10.json");

        // Listed out of order on purpose
        let mut records: Vec<(String, String)> = taken
            .iter()
            .enumerate()
            .map(|(i, key)| {
                (
                    key.clone(),
                    format!(r#"{{"date":"2024-01-01","response":"{}"}}"#, i),
                )
            })
            .collect();
        records.reverse();
        records.swap(0, 5);

        let entries = collect_entries(records);
        let order: Vec<String> = entries.iter().map(|e| e.response.clone()).collect();
        let expected: Vec<String> = (0..11).map(|i| i.to_string()).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_new_record_rejects_invalid() {
        let now = Local::now();
        let entry = NewEntry {
            response: "".into(),
            ..Default::default()
        };
        assert!(new_record(&entry, now).is_err());

        let entry = NewEntry {
            response: "text".into(),
            mood: Some(0),
            ..Default::default()
        };
        assert!(new_record(&entry, now).is_err());
    }
}
