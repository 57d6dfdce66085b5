//! Object store port: a byte blob store keyed by filename.

use crate::error::{EtlError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a blob by its exact filename. Fails with NotFound when absent.
    async fn read(&self, filename: &str) -> Result<Vec<u8>>;

    /// Upload a local file; the blob name is the file's basename.
    async fn write(&self, local_path: &Path) -> Result<()>;
}

/// Filesystem-backed store: one directory acting as the bucket.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.root.join(filename);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EtlError::NotFound(filename.to_string()))
            }
            Err(e) => Err(EtlError::Remote(format!(
                "Failed to read '{}': {}",
                filename, e
            ))),
        }
    }

    async fn write(&self, local_path: &Path) -> Result<()> {
        let filename = local_path
            .file_name()
            .ok_or_else(|| EtlError::Remote(format!("Not a file: {}", local_path.display())))?;

        tokio::fs::create_dir_all(&self.root).await?;
        let target = self.root.join(filename);
        tokio::fs::copy(local_path, &target)
            .await
            .map_err(|e| EtlError::Remote(format!("Upload failed for '{}': {}", local_path.display(), e)))?;

        info!("Uploaded '{}' to object store", filename.to_string_lossy());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        let err = store.read("absent.xlsx").await.unwrap_err();
        assert!(matches!(err, EtlError::NotFound(_)));
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().join("bucket");
        let store = FsObjectStore::new(&bucket);

        let local = dir.path().join("report.xlsx");
        std::fs::write(&local, b"payload").unwrap();
        store.write(&local).await.unwrap();

        let bytes = store.read("report.xlsx").await.unwrap();
        assert_eq!(bytes, b"payload");
    }
}
