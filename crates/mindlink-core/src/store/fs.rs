//! Directory-backed entry store (one JSON file per entry)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{DiaryEntry, NewEntry};

use super::{collect_entries, is_entry_key, new_record, unique_key, EntryStore};

/// Entry store keeping each diary entry in its own file
#[derive(Debug, Clone)]
pub struct FileEntryStore {
    dir: PathBuf,
}

impl FileEntryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the entry files
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl EntryStore for FileEntryStore {
    async fn list_entries(&self) -> Result<Vec<DiaryEntry>> {
        let mut dir = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            Error::StoreUnavailable(format!("cannot read {}: {}", self.dir.display(), e))
        })?;

        let mut records = Vec::new();
        loop {
            let item = dir.next_entry().await.map_err(|e| {
                Error::StoreUnavailable(format!("cannot list {}: {}", self.dir.display(), e))
            })?;
            let Some(item) = item else { break };

            let name = item.file_name().to_string_lossy().into_owned();
            if !is_entry_key(&name) {
                continue;
            }

            match tokio::fs::read_to_string(item.path()).await {
                Ok(content) => records.push((name, content)),
                Err(e) => warn!(key = %name, error = %e, "Skipping unreadable diary record"),
            }
        }

        let entries = collect_entries(records);
        debug!(count = entries.len(), dir = %self.dir.display(), "Loaded diary entries");
        Ok(entries)
    }

    async fn save_entry(&self, entry: &NewEntry) -> Result<String> {
        let (key, content) = new_record(entry, chrono::Local::now())?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let key = unique_key(key, |k| self.dir.join(k).exists());
        tokio::fs::write(self.dir.join(&key), content).await?;
        debug!(key = %key, "Saved diary entry");
        Ok(key)
    }

    fn describe(&self) -> String {
        format!("files:{}", self.dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_dir_is_store_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileEntryStore::new(tmp.path().join("nope"));
        let err = store.list_entries().await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_dir_lists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileEntryStore::new(tmp.path());
        assert!(store.list_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_list() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileEntryStore::new(tmp.path().join("entries"));

        let key = store
            .save_entry(&NewEntry {
                response: "walked the dog".into(),
                mood: Some(6),
                tags: vec!["outdoors".into()],
                prompt: Some("What made you smile?".into()),
            })
            .await
            .unwrap();
        assert!(is_entry_key(&key));
        assert!(tmp.path().join("entries").join(&key).exists());

        let entries = store.list_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response, "walked the dog");
        assert_eq!(entries[0].mood, Some(6));
        assert_eq!(entries[0].tags, vec!["outdoors".to_string()]);
    }

    #[tokio::test]
    async fn test_skips_foreign_and_corrupt_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("diary-2024-01-01-000000000.json"),
            r#"{"date":"2024-01-01","response":"a","mood":3,"tags":["school"]}"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("diary-2024-01-02-000000000.json"), "garbage").unwrap();
        std::fs::write(tmp.path().join("diary-2024-01-03.txt"), "old text format").unwrap();
        std::fs::write(tmp.path().join("settings.json"), "{}").unwrap();

        let store = FileEntryStore::new(tmp.path());
        let entries = store.list_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response, "a");
    }
}
