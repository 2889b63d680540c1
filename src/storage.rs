//! Storage client: accepts uploaded files and hands back stable references.

use crate::error::StorageError;
use crate::pipeline::input::BinaryFile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Result of a successful upload.
///
/// `path` addresses the stored file itself; `parent_id` addresses the
/// container it was placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub path: String,
    pub parent_id: String,
}

#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Store `file` and return where it landed.
    async fn upload(&self, file: &BinaryFile) -> Result<UploadedFile, StorageError>;

    /// Read back a file previously returned by [`StorageClient::upload`].
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;
}

/// Directory-backed storage: every upload gets its own fresh sub-directory.
///
/// ```text
/// <root>/<parent_id>/<file name>
/// ```
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage path to a file under the root, refusing anything that
    /// could climb out of it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(path);
        let safe = !path.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

/// Keep only the final component of an uploaded file name.
fn sanitise_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or("upload.bin")
        .to_string()
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn upload(&self, file: &BinaryFile) -> Result<UploadedFile, StorageError> {
        if file.is_empty() {
            return Err(StorageError::EmptyFile {
                name: file.name.clone(),
            });
        }

        let parent_id = Uuid::new_v4().simple().to_string();
        let name = sanitise_name(&file.name);
        let dir = self.root.join(&parent_id);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::Io {
                path: dir.clone(),
                source: e,
            })?;

        let target = dir.join(&name);
        tokio::fs::write(&target, &file.bytes)
            .await
            .map_err(|e| StorageError::Io {
                path: target.clone(),
                source: e,
            })?;

        debug!("Stored {} bytes at {}", file.len(), target.display());
        Ok(UploadedFile {
            path: format!("{parent_id}/{name}"),
            parent_id,
        })
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io {
                    path: full,
                    source: e,
                }
            }
        })
    }
}
