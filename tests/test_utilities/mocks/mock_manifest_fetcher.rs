use async_trait::async_trait;
use release_sbom::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Mock ManifestFetcher serving manifests from memory
#[derive(Default)]
pub struct MockManifestFetcher {
    manifests: HashMap<String, Value>,
}

impl MockManifestFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, reference: &str) -> Self {
        self.manifests.insert(
            reference.to_string(),
            json!({ "mediaType": "application/vnd.oci.image.manifest.v1+json" }),
        );
        self
    }

    pub fn with_index(mut self, reference: &str, children: &[&str]) -> Self {
        let manifests: Vec<Value> = children
            .iter()
            .map(|digest| json!({ "digest": digest, "mediaType": "application/vnd.oci.image.manifest.v1+json" }))
            .collect();
        self.manifests.insert(
            reference.to_string(),
            json!({ "mediaType": "application/vnd.oci.image.index.v1+json", "manifests": manifests }),
        );
        self
    }
}

#[async_trait]
impl ManifestFetcher for MockManifestFetcher {
    async fn get_image_manifest(&self, reference: &str) -> Result<Value> {
        match self.manifests.get(reference) {
            Some(manifest) => Ok(manifest.clone()),
            None => anyhow::bail!("Mock manifest fetcher: unknown reference {}", reference),
        }
    }
}
