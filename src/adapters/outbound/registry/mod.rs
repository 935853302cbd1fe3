/// OCI registry access
mod oras_manifest_fetcher;

pub use oras_manifest_fetcher::{OrasManifestFetcher, DEFAULT_ORAS_BIN};
