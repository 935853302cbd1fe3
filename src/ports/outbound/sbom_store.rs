use crate::shared::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// SbomStore port for reading and writing SBOM documents
///
/// Documents are read as raw bytes so that their digest can be checked
/// before they are parsed.
#[async_trait]
pub trait SbomStore: Send + Sync {
    /// Reads a document as downloaded.
    ///
    /// # Errors
    /// Returns an error if the file is missing or unsafe to read.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Writes `sbom` to `path`, replacing any previous content. Concurrent
    /// saves to the same path are serialized.
    async fn save(&self, path: &Path, sbom: &Value) -> Result<()>;
}
