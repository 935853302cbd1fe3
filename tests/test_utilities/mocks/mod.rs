/// Mock implementations for testing
mod mock_manifest_fetcher;
mod mock_provenance_client;

pub use mock_manifest_fetcher::MockManifestFetcher;
pub use mock_provenance_client::MockProvenanceClient;
