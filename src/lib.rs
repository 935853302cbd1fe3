//! release-sbom - release-time SBOM enrichment
//!
//! Build pipelines attach an SBOM to every image they push, describing the
//! image by its build-time repository. When the image is released, this
//! library rewrites those SPDX and CycloneDX documents so that they name the
//! destination repository, the release tags and, optionally, the release
//! itself.
//!
//! # Architecture
//!
//! - **Domain Layer** (`sbom_enrichment`): release images, purl codec,
//!   provenance parsing and the format handlers
//! - **Application Layer** (`application`): snapshot building and SBOM
//!   enrichment use cases
//! - **Ports** (`ports`): interfaces for registries, attestations and storage
//! - **Adapters** (`adapters`): `oras`, `cosign` and file system
//!   implementations of the ports
//! - **Shared** (`shared`): error types and file safety checks
//!
//! # Example
//!
//! ```no_run
//! use release_sbom::prelude::*;
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> Result<()> {
//! let docker_config = PathBuf::from("/root/.docker/config.json");
//! let spec = SnapshotSpec::load(Path::new("snapshot.json"))?;
//!
//! let snapshot = BuildSnapshotUseCase::new(OrasManifestFetcher::new(docker_config.clone()))
//!     .execute(&spec)
//!     .await?;
//!
//! let use_case = EnrichSbomsUseCase::new(
//!     CosignClient::new(docker_config),
//!     FileSystemSbomStore::new(),
//! );
//! let request = EnrichRequest::new(PathBuf::from("sboms"), None, false, 8);
//! let response = use_case.execute(&snapshot, &request).await?;
//! println!("{} SBOMs enriched", response.len());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod ports;
pub mod sbom_enrichment;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::cosign::CosignClient;
    pub use crate::adapters::outbound::filesystem::{FileSystemSbomStore, PathLocks};
    pub use crate::adapters::outbound::process::{run_async_subprocess, ScopedRegistryAuth};
    pub use crate::adapters::outbound::registry::OrasManifestFetcher;
    pub use crate::application::dto::{
        ComponentSpec, EnrichRequest, EnrichResponse, EnrichedSbom, SnapshotSpec,
    };
    pub use crate::application::use_cases::{
        construct_image, BuildSnapshotUseCase, EnrichSbomsUseCase,
    };
    pub use crate::ports::outbound::{ManifestFetcher, ProvenanceClient, SbomStore};
    pub use crate::sbom_enrichment::domain::{
        construct_purl, get_purl_arch, get_purl_digest, Component, Image, IndexImage,
        Provenance02, ReleaseImage, Snapshot,
    };
    pub use crate::sbom_enrichment::handlers::SbomFormat;
    pub use crate::shared::Result;
}
