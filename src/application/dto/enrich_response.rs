use crate::sbom_enrichment::handlers::SbomFormat;
use std::path::PathBuf;

/// One SBOM that was fetched, rewritten and saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedSbom {
    pub component: String,
    pub reference: String,
    pub path: PathBuf,
    pub format: SbomFormat,
    pub verified: bool,
}

/// EnrichResponse - Result of a successful enrichment run
#[derive(Debug, Clone, Default)]
pub struct EnrichResponse {
    /// Enriched SBOMs in snapshot order, each component image before its
    /// index children
    pub sboms: Vec<EnrichedSbom>,
}

impl EnrichResponse {
    pub fn new(sboms: Vec<EnrichedSbom>) -> Self {
        Self { sboms }
    }

    pub fn len(&self) -> usize {
        self.sboms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sboms.is_empty()
    }
}
