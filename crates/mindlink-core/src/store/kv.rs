//! Key-value entry store
//!
//! Keeps every record in one JSON object file mapping key → record string,
//! the same shape a browser's local storage has. Keys that are not diary
//! records (settings, last-entry markers) live alongside and are ignored.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{DiaryEntry, NewEntry};

use super::{collect_entries, new_record, unique_key, EntryStore};

/// Entry store backed by a single key-value JSON file
#[derive(Debug)]
pub struct KeyValueEntryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl KeyValueEntryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(Error::StoreUnavailable(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::StoreUnavailable(format!(
                "{} is not a key-value object",
                self.path.display()
            ))),
            Err(e) => Err(Error::StoreUnavailable(format!(
                "{} is not valid JSON: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_map(&self, map: Map<String, Value>) -> Result<()> {
        let path = self.path.clone();
        let body = serde_json::to_vec_pretty(&Value::Object(map))?;

        tokio::task::spawn_blocking(move || -> Result<()> {
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&dir)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&body)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| Error::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }
}

#[async_trait]
impl EntryStore for KeyValueEntryStore {
    async fn list_entries(&self) -> Result<Vec<DiaryEntry>> {
        let map = self.read_map().await?;
        let records = map
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect();

        let entries = collect_entries(records);
        debug!(count = entries.len(), path = %self.path.display(), "Loaded diary entries");
        Ok(entries)
    }

    async fn save_entry(&self, entry: &NewEntry) -> Result<String> {
        let (key, content) = new_record(entry, chrono::Local::now())?;

        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await?;
        let key = unique_key(key, |k| map.contains_key(k));
        map.insert(key.clone(), Value::String(content));
        self.write_map(map).await?;

        debug!(key = %key, "Saved diary entry");
        Ok(key)
    }

    fn describe(&self) -> String {
        format!("kv:{}", self.path.display())
    }
}
