use async_trait::async_trait;
use release_sbom::prelude::*;
use release_sbom::sbom_enrichment::domain::without_sha_header;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock ProvenanceClient serving SBOMs and provenances from memory
///
/// `fetch_sbom` writes the configured bytes to disk the way the cosign
/// client does, so the file system store can be used alongside it.
#[derive(Default)]
pub struct MockProvenanceClient {
    sboms: HashMap<String, Vec<u8>>,
    provenances: HashMap<String, Vec<Provenance02>>,
    provenance_calls: Arc<AtomicUsize>,
}

impl MockProvenanceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sbom(mut self, reference: &str, content: impl Into<Vec<u8>>) -> Self {
        self.sboms.insert(reference.to_string(), content.into());
        self
    }

    pub fn with_provenance(mut self, reference: &str, provenance: Provenance02) -> Self {
        self.provenances
            .entry(reference.to_string())
            .or_default()
            .push(provenance);
        self
    }

    /// Counter of `fetch_provenances` calls, readable after the mock has
    /// been moved into a use case.
    pub fn provenance_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.provenance_calls)
    }
}

#[async_trait]
impl ProvenanceClient for MockProvenanceClient {
    async fn fetch_provenances(&self, reference: &str) -> Result<Vec<Provenance02>> {
        self.provenance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.provenances.get(reference).cloned().unwrap_or_default())
    }

    async fn fetch_sbom(&self, dest_dir: &Path, reference: &str) -> Result<PathBuf> {
        let Some(content) = self.sboms.get(reference) else {
            anyhow::bail!("Mock provenance client: no SBOM for {}", reference);
        };

        let (_, digest) = reference
            .split_once('@')
            .ok_or_else(|| anyhow::anyhow!("not a digest reference: {}", reference))?;
        std::fs::create_dir_all(dest_dir)?;
        let path = dest_dir.join(without_sha_header(digest));
        std::fs::write(&path, content)?;
        Ok(path)
    }
}
