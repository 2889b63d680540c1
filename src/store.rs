//! Record store: key/value persistence for serialised submission records.
//!
//! Writes are all-or-nothing. [`FileRecordStore`] writes to a temp file and
//! renames it into place, so a reader (or a run cancelled mid-write) never
//! observes a half-written record.

use crate::error::RecordStoreError;
use crate::record::SubmissionRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), RecordStoreError>;

    /// Fetch the value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, RecordStoreError>;
}

/// Serialise `record` and store it under its own key.
pub async fn put_record(
    store: &dyn RecordStore,
    record: &SubmissionRecord,
) -> Result<(), RecordStoreError> {
    let json = record.to_json()?;
    store.set(&record.key(), json).await
}

/// Fetch and decode the record stored under `key`.
pub async fn get_record(
    store: &dyn RecordStore,
    key: &str,
) -> Result<Option<SubmissionRecord>, RecordStoreError> {
    match store.get(key).await? {
        Some(json) => Ok(Some(SubmissionRecord::from_json(&json)?)),
        None => Ok(None),
    }
}

/// One JSON file per key under a root directory.
///
/// `resume:<id>` is stored as `<root>/resume_<id>.json`. Keys may not
/// contain `_` themselves, so the file name maps back to exactly one key.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    root: PathBuf,
}

impl FileRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, RecordStoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '-'));
        if !valid {
            return Err(RecordStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", key.replace(':', "_"))))
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn set(&self, key: &str, value: String) -> Result<(), RecordStoreError> {
        let path = self.path_for(key)?;
        let io_err = |source| RecordStoreError::Io {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(io_err)?;

        // Atomic write: temp file in the same directory, then rename.
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, value.as_bytes())
            .await
            .map_err(io_err)?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(io_err)?;

        debug!("Stored record '{}' at {}", key, path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, RecordStoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RecordStoreError::Io { path, source }),
        }
    }
}

/// In-process record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn set(&self, key: &str, value: String) -> Result<(), RecordStoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, RecordStoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }
}
