use crate::application::dto::{EnrichRequest, EnrichResponse, EnrichedSbom};
use crate::ports::outbound::{ProvenanceClient, SbomStore};
use crate::sbom_enrichment::domain::{sha256_digest, Component, ReleaseImage, Snapshot};
use crate::sbom_enrichment::handlers::SbomFormat;
use crate::shared::error::SbomError;
use crate::shared::security::sanitize_path_segment;
use crate::shared::Result;
use futures::stream::{self, StreamExt};
use serde_json::Value;

/// EnrichSbomsUseCase - Rewrites the SBOM of every image in a release
///
/// For each component, the SBOM of its image and (for an index) of every
/// child is downloaded, optionally verified against the build provenance,
/// rewritten to the released coordinates and saved in place.
///
/// # Type Parameters
/// * `PC` - ProvenanceClient implementation
/// * `S` - SbomStore implementation
pub struct EnrichSbomsUseCase<PC, S> {
    provenance_client: PC,
    store: S,
}

impl<PC, S> EnrichSbomsUseCase<PC, S>
where
    PC: ProvenanceClient,
    S: SbomStore,
{
    pub fn new(provenance_client: PC, store: S) -> Self {
        Self {
            provenance_client,
            store,
        }
    }

    /// Processes every SBOM, at most `request.concurrency` at a time.
    ///
    /// All SBOMs are attempted even when some fail. Each failure is logged
    /// and the first one in snapshot order is returned.
    pub async fn execute(&self, snapshot: &Snapshot, request: &EnrichRequest) -> Result<EnrichResponse> {
        let targets: Vec<(&Component, ReleaseImage)> = snapshot
            .components()
            .iter()
            .flat_map(|component| {
                component
                    .image()
                    .sbom_targets()
                    .into_iter()
                    .map(move |image| (component, image))
            })
            .collect();

        tracing::info!(
            sboms = targets.len(),
            concurrency = request.concurrency,
            verify = request.verify,
            "Enriching SBOMs"
        );

        let results: Vec<(String, Result<EnrichedSbom>)> = stream::iter(targets.iter())
            .map(|(component, image)| async move {
                let reference = component.build_reference(image.digest());
                let result = self.enrich_one(component, image, &reference, request).await;
                (reference, result)
            })
            .buffered(request.concurrency.max(1))
            .collect()
            .await;

        let mut sboms = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (reference, result) in results {
            match result {
                Ok(sbom) => sboms.push(sbom),
                Err(e) => {
                    tracing::error!(reference = %reference, error = %e, "Failed to enrich SBOM");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(EnrichResponse::new(sboms)),
        }
    }

    async fn enrich_one(
        &self,
        component: &Component,
        image: &ReleaseImage,
        reference: &str,
        request: &EnrichRequest,
    ) -> Result<EnrichedSbom> {
        let destination = request
            .output_path
            .join(sanitize_path_segment(component.name()));
        let path = self
            .provenance_client
            .fetch_sbom(&destination, reference)
            .await?;
        let raw = self.store.read(&path).await?;

        if request.verify {
            self.verify(reference, &raw).await?;
        }

        let mut sbom: Value = serde_json::from_slice(&raw).map_err(|e| {
            SbomError::format(format!("SBOM of {} is not valid JSON: {}", reference, e))
        })?;

        let format = SbomFormat::detect(&sbom).ok_or_else(|| SbomError::UnsupportedSbomFormat {
            reference: reference.to_string(),
        })?;

        format.update_sbom(component, image, &mut sbom)?;
        if let Some(release_id) = &request.release_id {
            format.annotate_release(&mut sbom, release_id)?;
        }

        self.store.save(&path, &sbom).await?;
        tracing::info!(
            reference,
            format = %format,
            path = %path.display(),
            "Enriched SBOM"
        );

        Ok(EnrichedSbom {
            component: component.name().to_string(),
            reference: reference.to_string(),
            path,
            format,
            verified: request.verify,
        })
    }

    /// Checks the downloaded bytes against the SBOM digest recorded by the
    /// latest build of `reference`.
    async fn verify(&self, reference: &str, raw: &[u8]) -> Result<()> {
        let provenance = self
            .provenance_client
            .fetch_latest_provenance(reference)
            .await?;
        let expected = provenance.get_sbom_digest(reference)?;
        let actual = sha256_digest(raw);

        if expected != actual {
            return Err(SbomError::Verification {
                reference: reference.to_string(),
                expected,
                actual,
            }
            .into());
        }

        tracing::debug!(reference, digest = %actual, "SBOM matches provenance");
        Ok(())
    }
}
