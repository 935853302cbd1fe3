use crate::sbom_enrichment::domain::{latest_provenance, Provenance02};
use crate::shared::error::SbomError;
use crate::shared::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// ProvenanceClient port for signed build attestations and the SBOMs
/// attached to an image
///
/// # Async Support
/// All methods are async; SBOMs for every image in a release are fetched
/// concurrently. Implementations must be `Send + Sync`.
#[async_trait]
pub trait ProvenanceClient: Send + Sync {
    /// Fetches and verifies every SLSA v0.2 provenance attached to
    /// `reference`.
    ///
    /// # Errors
    /// Returns an error if verification fails or the attestation output
    /// cannot be parsed.
    async fn fetch_provenances(&self, reference: &str) -> Result<Vec<Provenance02>>;

    /// Downloads the SBOM attached to `reference` into `dest_dir`.
    ///
    /// # Returns
    /// Path of the written file
    async fn fetch_sbom(&self, dest_dir: &Path, reference: &str) -> Result<PathBuf>;

    /// Fetches the provenance of the most recent build of `reference`.
    ///
    /// # Errors
    /// Returns [`SbomError::NoProvenance`] if no attestation was found.
    async fn fetch_latest_provenance(&self, reference: &str) -> Result<Provenance02> {
        let provenances = self.fetch_provenances(reference).await?;
        latest_provenance(provenances).ok_or_else(|| {
            SbomError::NoProvenance {
                reference: reference.to_string(),
            }
            .into()
        })
    }
}
