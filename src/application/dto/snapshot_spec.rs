use crate::sbom_enrichment::domain::split_digest_reference;
use crate::shared::error::SbomError;
use crate::shared::security::validate_regular_file;
use crate::shared::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One component entry of a release snapshot.
///
/// Fields other than these are ignored; snapshots carry a lot of build
/// metadata that enrichment does not need.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    /// `<build repository>@sha256:<hex>`
    #[serde(rename = "containerImage")]
    pub container_image: String,
    /// Destination repository the image is released to
    #[serde(rename = "rh-registry-repo")]
    pub rh_registry_repo: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ComponentSpec {
    /// Repository part of `containerImage`.
    pub fn build_repository(&self) -> Result<&str> {
        split_digest_reference(&self.container_image).map(|(repository, _)| repository)
    }

    /// Digest part of `containerImage`.
    pub fn digest(&self) -> Result<&str> {
        split_digest_reference(&self.container_image).map(|(_, digest)| digest)
    }
}

/// The release snapshot JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotSpec {
    pub components: Vec<ComponentSpec>,
}

impl SnapshotSpec {
    /// Reads and validates a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        validate_regular_file(path, "snapshot spec")?;

        let content = fs::read_to_string(path).map_err(|e| SbomError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parses a snapshot and checks every `containerImage` is a digest
    /// reference.
    pub fn parse(content: &str) -> Result<Self> {
        let spec: SnapshotSpec =
            serde_json::from_str(content).map_err(|e| SbomError::Validation {
                message: format!("Invalid snapshot spec: {}", e),
            })?;

        for component in &spec.components {
            split_digest_reference(&component.container_image)?;
        }

        Ok(spec)
    }
}
