//! In-memory entry store

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{DiaryEntry, NewEntry};

use super::{collect_entries, new_record, unique_key, EntryStore};

/// Entry store holding raw records in memory
///
/// Clones share the same records. Raw strings are kept so malformed records
/// can be exercised the same way as on disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryEntryStore {
    records: Arc<RwLock<Vec<(String, String)>>>,
    unavailable: bool,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose enumeration always fails
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Build a store from already-parsed entries
    pub fn with_entries(entries: &[DiaryEntry]) -> Self {
        let store = Self::new();
        for (i, entry) in entries.iter().enumerate() {
            let key = format!("diary-{}-{:09}.json", entry.date, i);
            // DiaryEntry always serializes
            let content = serde_json::to_string(entry).unwrap_or_default();
            store.insert_raw(&key, &content);
        }
        store
    }

    /// Insert a raw record exactly as it would be stored
    pub fn insert_raw(&self, key: &str, content: &str) {
        if let Ok(mut records) = self.records.write() {
            records.push((key.to_string(), content.to_string()));
        }
    }

    /// Number of raw records held (including malformed ones)
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn list_entries(&self) -> Result<Vec<DiaryEntry>> {
        if self.unavailable {
            return Err(Error::StoreUnavailable("memory store marked unavailable".into()));
        }
        let records = self
            .records
            .read()
            .map_err(|_| Error::StoreUnavailable("memory store lock poisoned".into()))?
            .clone();
        Ok(collect_entries(records))
    }

    async fn save_entry(&self, entry: &NewEntry) -> Result<String> {
        let (key, content) = new_record(entry, chrono::Local::now())?;
        let mut records = self
            .records
            .write()
            .map_err(|_| Error::StoreUnavailable("memory store lock poisoned".into()))?;
        let key = unique_key(key, |k| records.iter().any(|(existing, _)| existing == k));
        records.push((key.clone(), content));
        Ok(key)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_entries_round_trips_order() {
        let entries = vec![
            DiaryEntry {
                date: "2024-01-01".into(),
                response: "a".into(),
                mood: Some(3),
                tags: vec!["school".into()],
                prompt: None,
            },
            DiaryEntry {
                date: "2024-01-02".into(),
                response: "b".into(),
                mood: Some(8),
                tags: vec![],
                prompt: None,
            },
        ];
        let store = MemoryEntryStore::with_entries(&entries);
        assert_eq!(store.list_entries().await.unwrap(), entries);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryEntryStore::unavailable();
        assert!(matches!(
            store.list_entries().await,
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let store = MemoryEntryStore::new();
        let other = store.clone();
        other
            .save_entry(&NewEntry {
                response: "shared".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }
}
