use crate::shared::Result;
use async_trait::async_trait;
use serde_json::Value;

/// ManifestFetcher port for reading OCI manifests from a registry
///
/// # Async Support
/// Implementations must be `Send + Sync` so that components can be
/// resolved concurrently.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Fetches the manifest that `reference` (`repository@sha256:...`)
    /// points to.
    ///
    /// # Returns
    /// The manifest as parsed JSON. Its `mediaType` tells an index from a
    /// single image manifest.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The registry cannot be reached or refuses the credentials
    /// - The response is not valid JSON
    async fn get_image_manifest(&self, reference: &str) -> Result<Value>;
}
