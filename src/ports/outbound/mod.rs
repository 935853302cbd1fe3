/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces the enrichment core uses to talk to
/// registries, the signing tool and the file system.
pub mod manifest_fetcher;
pub mod provenance_client;
pub mod sbom_store;

pub use manifest_fetcher::ManifestFetcher;
pub use provenance_client::ProvenanceClient;
pub use sbom_store::SbomStore;
