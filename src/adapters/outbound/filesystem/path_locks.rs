use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-path async write locks
///
/// Clones share the same map, so every adapter writing SBOM files can hold
/// the same handle and writes to one path never interleave.
#[derive(Clone, Default)]
pub struct PathLocks {
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `path`. Released when the guard drops.
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Number of distinct paths locked so far.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
