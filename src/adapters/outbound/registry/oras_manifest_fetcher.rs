use crate::adapters::outbound::process::{
    run_async_subprocess, ScopedRegistryAuth, DEFAULT_RETRY_TIMES,
};
use crate::ports::outbound::ManifestFetcher;
use crate::shared::error::SbomError;
use crate::shared::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_ORAS_BIN: &str = "oras";

/// OrasManifestFetcher adapter implementing the ManifestFetcher port
///
/// Runs `oras manifest fetch` with a registry config scoped to the
/// reference being fetched.
pub struct OrasManifestFetcher {
    oras_bin: String,
    docker_config: PathBuf,
    retry_times: u32,
}

impl OrasManifestFetcher {
    pub fn new(docker_config: PathBuf) -> Self {
        Self {
            oras_bin: DEFAULT_ORAS_BIN.to_string(),
            docker_config,
            retry_times: DEFAULT_RETRY_TIMES,
        }
    }

    pub fn with_binary(mut self, oras_bin: impl Into<String>) -> Self {
        self.oras_bin = oras_bin.into();
        self
    }

    pub fn with_retry_times(mut self, retry_times: u32) -> Self {
        self.retry_times = retry_times;
        self
    }
}

#[async_trait]
impl ManifestFetcher for OrasManifestFetcher {
    async fn get_image_manifest(&self, reference: &str) -> Result<Value> {
        tracing::info!(reference, "Fetching manifest");

        let auth = ScopedRegistryAuth::for_reference(reference, &self.docker_config)?;
        let cmd = vec![
            self.oras_bin.clone(),
            "manifest".to_string(),
            "fetch".to_string(),
            "--registry-config".to_string(),
            auth.config_path().display().to_string(),
            reference.to_string(),
        ];
        tracing::debug!(reference, command = %cmd.join(" "), "Running oras");

        let output = run_async_subprocess(&cmd, None, self.retry_times).await?;
        if !output.success() {
            return Err(SbomError::CommandFailed {
                command: format!("{} manifest fetch", self.oras_bin),
                reference: reference.to_string(),
                code: output.code,
                stderr: output.stderr_lossy(),
            }
            .into());
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            SbomError::format(format!("manifest of {} is not valid JSON: {}", reference, e)).into()
        })
    }
}
