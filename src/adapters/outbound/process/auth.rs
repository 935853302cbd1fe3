use crate::shared::error::SbomError;
use crate::shared::Result;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONFIG_FILE_NAME: &str = "config.json";

/// A docker config holding only the credentials for one image reference.
///
/// External tools get a throwaway config instead of the user's full
/// credential store. The directory is removed when this value is dropped.
#[derive(Debug)]
pub struct ScopedRegistryAuth {
    dir: TempDir,
    config_path: PathBuf,
}

impl ScopedRegistryAuth {
    /// Writes a scoped config for `reference` (`registry/repo@sha256:...`)
    /// taken from `docker_config`.
    ///
    /// The most specific `auths` entry wins: `registry/org/repo`, then
    /// `registry/org`, then `registry`. The token is always stored under
    /// the bare registry name. Registry ports are not supported.
    pub fn for_reference(reference: &str, docker_config: &Path) -> Result<Self> {
        tracing::debug!(
            reference,
            docker_config = %docker_config.display(),
            "Creating scoped registry auth"
        );

        if !docker_config.is_file() {
            return Err(SbomError::RegistryAuth {
                path: docker_config.to_path_buf(),
                reason: "No docker config file found".to_string(),
            }
            .into());
        }

        if reference.matches(':').count() > 1 {
            tracing::warn!(
                reference,
                "Multiple ':' symbols in reference. Registry ports are not supported."
            );
        }

        let auths = read_auths(docker_config)?;
        tracing::debug!(
            docker_config = %docker_config.display(),
            available = ?auths.keys().collect::<Vec<_>>(),
            "Registry auth entries available"
        );

        let repository = reference.split('@').next().unwrap_or(reference);
        let registry = repository.split('/').next().unwrap_or(repository);

        let scoped = match find_token(&auths, repository) {
            Some(token) => json!({ "auths": { registry: token } }),
            None => {
                tracing::warn!(reference, "No registry authentication found");
                json!({ "auths": {} })
            }
        };

        let dir = TempDir::new().map_err(|e| SbomError::RegistryAuth {
            path: docker_config.to_path_buf(),
            reason: format!("Failed to create temporary directory: {}", e),
        })?;
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, scoped.to_string()).map_err(|e| SbomError::FileWriteError {
            path: config_path.clone(),
            details: e.to_string(),
        })?;

        Ok(Self { dir, config_path })
    }

    /// The scoped `config.json`, for `--registry-config` style flags.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The directory holding `config.json`, for `DOCKER_CONFIG`.
    pub fn config_dir(&self) -> &Path {
        self.dir.path()
    }
}

fn read_auths(docker_config: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(docker_config).map_err(|e| SbomError::RegistryAuth {
        path: docker_config.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: Value = serde_json::from_str(&content).map_err(|e| SbomError::RegistryAuth {
        path: docker_config.to_path_buf(),
        reason: format!("Invalid JSON: {}", e),
    })?;

    Ok(config
        .get("auths")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default())
}

/// Walks `repository` up one path segment at a time looking for a token.
fn find_token<'a>(auths: &'a Map<String, Value>, repository: &str) -> Option<&'a Value> {
    let mut current = repository;
    loop {
        if let Some(token) = auths.get(current) {
            return Some(token);
        }
        current = current.rsplit_once('/')?.0;
    }
}
