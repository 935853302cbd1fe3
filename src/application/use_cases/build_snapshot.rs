use crate::application::dto::{ComponentSpec, SnapshotSpec};
use crate::ports::outbound::ManifestFetcher;
use crate::sbom_enrichment::domain::{
    make_reference, Component, Image, IndexImage, ReleaseImage, Snapshot,
};
use crate::shared::error::SbomError;
use crate::shared::Result;
use futures::future::try_join_all;
use serde_json::Value;

const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";
const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
const DOCKER_MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";

/// Resolves `repository@digest` into a single image or an index with its
/// children, based on the manifest media type.
pub async fn construct_image<MF: ManifestFetcher + ?Sized>(
    fetcher: &MF,
    repository: &str,
    digest: &str,
) -> Result<ReleaseImage> {
    let reference = make_reference(repository, digest);
    let manifest = fetcher.get_image_manifest(&reference).await?;

    let media_type = manifest
        .get("mediaType")
        .and_then(Value::as_str)
        .ok_or_else(|| SbomError::format(format!("manifest of {} has no mediaType", reference)))?;

    match media_type {
        OCI_MANIFEST | DOCKER_MANIFEST => Ok(Image::new(digest).into()),
        OCI_INDEX | DOCKER_MANIFEST_LIST => {
            let children = manifest
                .get("manifests")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(|child| {
                    child
                        .get("digest")
                        .and_then(Value::as_str)
                        .map(Image::new)
                        .ok_or_else(|| {
                            SbomError::format(format!(
                                "index {} lists a manifest without digest",
                                reference
                            ))
                        })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(IndexImage::new(digest, children).into())
        }
        other => Err(SbomError::UnsupportedMediaType {
            reference,
            media_type: other.to_string(),
        }
        .into()),
    }
}

/// BuildSnapshotUseCase - Turns a release snapshot into domain components
///
/// Every component's manifest is fetched concurrently; the result keeps
/// the snapshot order.
pub struct BuildSnapshotUseCase<MF> {
    manifest_fetcher: MF,
}

impl<MF: ManifestFetcher> BuildSnapshotUseCase<MF> {
    pub fn new(manifest_fetcher: MF) -> Self {
        Self { manifest_fetcher }
    }

    pub async fn execute(&self, spec: &SnapshotSpec) -> Result<Snapshot> {
        let components =
            try_join_all(spec.components.iter().map(|component| self.make_component(component)))
                .await?;

        tracing::info!(components = components.len(), "Resolved release snapshot");
        Ok(Snapshot::new(components))
    }

    async fn make_component(&self, spec: &ComponentSpec) -> Result<Component> {
        let build_repository = spec.build_repository()?;
        let image = construct_image(&self.manifest_fetcher, build_repository, spec.digest()?).await?;

        Ok(Component::new(
            spec.name.clone(),
            spec.rh_registry_repo.clone(),
            build_repository,
            image,
            spec.tags.clone(),
        ))
    }
}
