use crate::adapters::outbound::filesystem::PathLocks;
use crate::adapters::outbound::process::{
    run_async_subprocess, ProcessOutput, ScopedRegistryAuth, DEFAULT_RETRY_TIMES,
};
use crate::ports::outbound::ProvenanceClient;
use crate::sbom_enrichment::domain::{reference_digest, without_sha_header, Provenance02};
use crate::shared::error::SbomError;
use crate::shared::security::validate_write_target;
use crate::shared::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_COSIGN_BIN: &str = "cosign";

/// CosignClient adapter implementing the ProvenanceClient port
///
/// Every invocation gets its own [`ScopedRegistryAuth`] exposed through
/// `DOCKER_CONFIG`.
pub struct CosignClient {
    cosign_bin: String,
    verification_key: Option<PathBuf>,
    docker_config: PathBuf,
    retry_times: u32,
    path_locks: PathLocks,
}

impl CosignClient {
    pub fn new(docker_config: PathBuf) -> Self {
        Self {
            cosign_bin: DEFAULT_COSIGN_BIN.to_string(),
            verification_key: None,
            docker_config,
            retry_times: DEFAULT_RETRY_TIMES,
            path_locks: PathLocks::new(),
        }
    }

    pub fn with_binary(mut self, cosign_bin: impl Into<String>) -> Self {
        self.cosign_bin = cosign_bin.into();
        self
    }

    /// Public key used to verify attestations. Without one, provenance
    /// cannot be fetched.
    pub fn with_verification_key(mut self, verification_key: Option<PathBuf>) -> Self {
        self.verification_key = verification_key;
        self
    }

    pub fn with_retry_times(mut self, retry_times: u32) -> Self {
        self.retry_times = retry_times;
        self
    }

    /// Locks taken around each SBOM download write. Share them with the
    /// store that saves the rewritten SBOMs.
    pub fn with_path_locks(mut self, path_locks: PathLocks) -> Self {
        self.path_locks = path_locks;
        self
    }

    async fn run(&self, args: &[String], reference: &str) -> Result<ProcessOutput> {
        let auth = ScopedRegistryAuth::for_reference(reference, &self.docker_config)?;
        let env = HashMap::from([(
            "DOCKER_CONFIG".to_string(),
            auth.config_dir().display().to_string(),
        )]);

        let cmd: Vec<String> = std::iter::once(self.cosign_bin.clone())
            .chain(args.iter().cloned())
            .collect();
        tracing::debug!(reference, command = %cmd.join(" "), "Running cosign");

        let output = run_async_subprocess(&cmd, Some(&env), self.retry_times).await?;
        if !output.success() {
            return Err(SbomError::CommandFailed {
                command: format!(
                    "{} {}",
                    self.cosign_bin,
                    args.first().map(String::as_str).unwrap_or_default()
                ),
                reference: reference.to_string(),
                code: output.code,
                stderr: output.stderr_lossy(),
            }
            .into());
        }

        Ok(output)
    }
}

#[async_trait]
impl ProvenanceClient for CosignClient {
    async fn fetch_provenances(&self, reference: &str) -> Result<Vec<Provenance02>> {
        let key = self.verification_key.as_ref().ok_or_else(|| SbomError::Validation {
            message: "A verification key is required to fetch provenance".to_string(),
        })?;

        let args = vec![
            "verify-attestation".to_string(),
            format!("--key={}", key.display()),
            "--type=slsaprovenance02".to_string(),
            "--insecure-ignore-tlog=true".to_string(),
            reference.to_string(),
        ];
        let output = self.run(&args, reference).await?;

        let provenances = output
            .stdout
            .split(|byte| *byte == b'\n')
            .filter(|line| !line.trim_ascii().is_empty())
            .map(Provenance02::from_cosign_output)
            .collect::<Result<Vec<_>>>()?;

        if provenances.is_empty() {
            return Err(SbomError::NoProvenance {
                reference: reference.to_string(),
            }
            .into());
        }

        tracing::debug!(reference, count = provenances.len(), "Parsed provenances");
        Ok(provenances)
    }

    async fn fetch_sbom(&self, dest_dir: &Path, reference: &str) -> Result<PathBuf> {
        let digest = reference_digest(reference)?;

        let args = vec![
            "download".to_string(),
            "sbom".to_string(),
            reference.to_string(),
        ];
        let output = self.run(&args, reference).await?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| SbomError::FileWriteError {
                path: dest_dir.to_path_buf(),
                details: e.to_string(),
            })?;

        let path = dest_dir.join(without_sha_header(digest));
        {
            let _guard = self.path_locks.lock(&path).await;
            validate_write_target(&path)?;
            tokio::fs::write(&path, &output.stdout)
                .await
                .map_err(|e| SbomError::FileWriteError {
                    path: path.clone(),
                    details: e.to_string(),
                })?;
        }

        tracing::info!(reference, path = %path.display(), "Downloaded SBOM");
        Ok(path)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde_json::json;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    const REFERENCE: &str = "quay.io/org/repo@sha256:aaaa";

    struct Fixture {
        dir: TempDir,
        docker_config: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let docker_config = dir.path().join("docker.json");
            fs::write(
                &docker_config,
                json!({ "auths": { "quay.io": { "auth": "dG9rZW4=" } } }).to_string(),
            )
            .unwrap();
            Self { dir, docker_config }
        }

        /// Writes an executable fake cosign running `body`.
        fn cosign(&self, body: &str) -> CosignClient {
            let path = self.dir.path().join("cosign");
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

            CosignClient::new(self.docker_config.clone())
                .with_binary(path.display().to_string())
                .with_verification_key(Some(self.dir.path().join("cosign.pub")))
                .with_retry_times(0)
        }
    }

    fn attestation_line(finished_on: &str) -> String {
        let statement = json!({
            "predicateType": "https://slsa.dev/provenance/v0.2",
            "predicate": { "metadata": { "buildFinishedOn": finished_on } },
        });
        json!({ "payload": BASE64.encode(statement.to_string()) }).to_string()
    }

    #[tokio::test]
    async fn test_fetch_provenances_parses_each_line() {
        let fixture = Fixture::new();
        let client = fixture.cosign(&format!(
            "[ \"$1\" = verify-attestation ] || exit 9\ncat <<'LINES'\n{}\n{}\nLINES",
            attestation_line("2024-01-01T00:00:00Z"),
            attestation_line("2024-06-01T00:00:00Z"),
        ));

        let provenances = client.fetch_provenances(REFERENCE).await.unwrap();
        assert_eq!(provenances.len(), 2);

        let latest = client.fetch_latest_provenance(REFERENCE).await.unwrap();
        assert_eq!(latest.build_finished_on().to_rfc3339(), "2024-06-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_fetch_provenances_without_output() {
        let fixture = Fixture::new();
        let client = fixture.cosign("exit 0");

        let err = client.fetch_provenances(REFERENCE).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SbomError>(),
            Some(SbomError::NoProvenance { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_provenances_requires_key() {
        let fixture = Fixture::new();
        let client = fixture.cosign("exit 0").with_verification_key(None);

        let err = client.fetch_provenances(REFERENCE).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SbomError>(),
            Some(SbomError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_command_failure_carries_stderr() {
        let fixture = Fixture::new();
        let client = fixture.cosign("echo 'no matching attestations' >&2\nexit 1");

        let err = client.fetch_provenances(REFERENCE).await.unwrap_err();
        match err.downcast_ref::<SbomError>() {
            Some(SbomError::CommandFailed { code, stderr, .. }) => {
                assert_eq!(*code, 1);
                assert_eq!(stderr, "no matching attestations");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_sbom_writes_digest_named_file() {
        let fixture = Fixture::new();
        let client = fixture.cosign(
            "[ \"$1 $2\" = \"download sbom\" ] || exit 9\n\
             [ -f \"$DOCKER_CONFIG/config.json\" ] || exit 8\n\
             printf '{\"spdxVersion\":\"SPDX-2.3\"}'",
        );
        let dest = fixture.dir.path().join("out").join("component");

        let path = client.fetch_sbom(&dest, REFERENCE).await.unwrap();

        assert_eq!(path, dest.join("aaaa"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"spdxVersion\":\"SPDX-2.3\"}");
    }

    #[tokio::test]
    async fn test_fetch_sbom_waits_for_path_lock() {
        let fixture = Fixture::new();
        let locks = PathLocks::new();
        let client = fixture
            .cosign("printf '{\"spdxVersion\":\"SPDX-2.3\"}'")
            .with_path_locks(locks.clone());
        let dest = fixture.dir.path().join("out").join("component");
        let target = dest.join("aaaa");

        let guard = locks.lock(&target).await;
        let fetch = {
            let dest = dest.clone();
            tokio::spawn(async move { client.fetch_sbom(&dest, REFERENCE).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert!(!fetch.is_finished());
        assert!(!target.exists());

        drop(guard);
        let path = fetch.await.unwrap().unwrap();
        assert_eq!(path, target);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"spdxVersion\":\"SPDX-2.3\"}");
    }
}
