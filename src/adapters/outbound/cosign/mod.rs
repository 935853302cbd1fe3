/// Provenance and SBOM retrieval through the cosign CLI
mod cosign_client;

pub use cosign_client::{CosignClient, DEFAULT_COSIGN_BIN};
