use super::PathLocks;
use crate::ports::outbound::SbomStore;
use crate::shared::error::SbomError;
use crate::shared::security::{validate_regular_file, validate_write_target};
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// FileSystemSbomStore adapter implementing the SbomStore port
///
/// Reads are checked the same way as any other input file (no symlinks,
/// regular file, size limit). Saves to the same path are serialized with a
/// per-path async lock shared by every clone of the store, and by any
/// downloader given the same [`PathLocks`].
#[derive(Clone, Default)]
pub struct FileSystemSbomStore {
    locks: PathLocks,
}

impl FileSystemSbomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locks(locks: PathLocks) -> Self {
        Self { locks }
    }

    pub fn locks(&self) -> &PathLocks {
        &self.locks
    }
}

#[async_trait]
impl SbomStore for FileSystemSbomStore {
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        validate_regular_file(path, "SBOM")?;

        tokio::fs::read(path).await.map_err(|e| {
            SbomError::FileReadError {
                path: path.to_path_buf(),
                details: e.to_string(),
            }
            .into()
        })
    }

    async fn save(&self, path: &Path, sbom: &Value) -> Result<()> {
        let content = serde_json::to_vec(sbom)?;

        let _guard = self.locks.lock(path).await;

        validate_write_target(path)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| SbomError::FileWriteError {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;

        tracing::debug!(path = %path.display(), "Saved SBOM");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sbom.json");
        let store = FileSystemSbomStore::new();
        let sbom = json!({ "spdxVersion": "SPDX-2.3", "packages": [] });

        store.save(&path, &sbom).await.unwrap();

        let raw = store.read(&path).await.unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&raw).unwrap(), sbom);
    }

    #[tokio::test]
    async fn test_save_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sbom.json");
        std::fs::write(&path, "{\"old\": true, \"padding\": \"xxxxxxxxxxxxxxxx\"}").unwrap();
        let store = FileSystemSbomStore::new();

        store.save(&path, &json!({ "new": true })).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"new\":true}");
    }

    #[tokio::test]
    async fn test_read_returns_bytes_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sbom.json");
        std::fs::write(&path, "not json\n").unwrap();

        let raw = FileSystemSbomStore::new().read(&path).await.unwrap();
        assert_eq!(raw, b"not json\n");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = FileSystemSbomStore::new()
            .read(&dir.path().join("missing.json"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_saves_share_one_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sbom.json");
        let store = FileSystemSbomStore::new();

        let saves = (0..16).map(|i| {
            let store = store.clone();
            let path = path.clone();
            tokio::spawn(async move { store.save(&path, &json!({ "writer": i })).await })
        });
        for handle in futures::future::join_all(saves).await {
            handle.unwrap().unwrap();
        }

        assert_eq!(store.locks().len(), 1);
        let saved: Value = serde_json::from_slice(&store.read(&path).await.unwrap()).unwrap();
        assert!(saved["writer"].is_number());
    }
}
