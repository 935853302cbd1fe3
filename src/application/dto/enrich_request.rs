use std::path::PathBuf;

/// EnrichRequest - Options for one enrichment run
#[derive(Debug, Clone)]
pub struct EnrichRequest {
    /// Directory SBOMs are downloaded to, one subdirectory per component
    pub output_path: PathBuf,
    /// Release identifier recorded in every SBOM, if given
    pub release_id: Option<String>,
    /// Whether to check each SBOM against the digest in its provenance
    pub verify: bool,
    /// Maximum number of SBOMs processed at once
    pub concurrency: usize,
}

impl EnrichRequest {
    pub fn new(
        output_path: PathBuf,
        release_id: Option<String>,
        verify: bool,
        concurrency: usize,
    ) -> Self {
        Self {
            output_path,
            release_id,
            verify,
            concurrency,
        }
    }
}
