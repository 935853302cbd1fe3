//! Configuration file support for release-sbom.
//!
//! Provides YAML-based configuration through `release-sbom.config.yml`
//! files and merges it with command-line arguments.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::logging::{LogFormat, LogLevel};
use release_sbom::adapters::outbound::cosign::DEFAULT_COSIGN_BIN;
use release_sbom::adapters::outbound::process::DEFAULT_RETRY_TIMES;
use release_sbom::adapters::outbound::registry::DEFAULT_ORAS_BIN;
use release_sbom::shared::Result;

const CONFIG_FILENAME: &str = "release-sbom.config.yml";

const DEFAULT_CONCURRENCY: usize = 8;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub verification_key: Option<PathBuf>,
    pub docker_config: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub retry_times: Option<u32>,
    pub cosign_bin: Option<String>,
    pub oras_bin: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.concurrency == Some(0) {
        bail!(
            "Invalid config: concurrency must be at least 1.\n\n\
             💡 Hint: Remove the key to use the default of {}.",
            DEFAULT_CONCURRENCY
        );
    }
    if let Some(ref level) = config.log_level {
        level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    }
    if let Some(ref format) = config.log_format {
        format
            .parse::<LogFormat>()
            .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    }
    for (key, value) in [("cosign_bin", &config.cosign_bin), ("oras_bin", &config.oras_bin)] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            bail!("Invalid config: {} must not be empty.", key);
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
///
/// Runs before tracing is set up, so this writes to stderr directly.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        eprintln!("⚠️  Warning: Unknown config field '{}' will be ignored.", key);
    }
}

/// Settings for one run, after merging CLI arguments over the config file
/// over defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub snapshot_path: PathBuf,
    pub output_path: PathBuf,
    pub release_id: Option<String>,
    pub verification_key: Option<PathBuf>,
    pub docker_config: PathBuf,
    pub concurrency: usize,
    pub retry_times: u32,
    pub cosign_bin: String,
    pub oras_bin: String,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn resolve(args: Args, config: Option<ConfigFile>) -> Result<Self> {
        let config = config.unwrap_or_default();

        if args.concurrency == Some(0) {
            bail!("--concurrency must be at least 1");
        }

        let log_level = match (args.log_level, config.log_level.as_deref()) {
            (Some(level), _) => level,
            (None, Some(raw)) => raw.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            (None, None) => LogLevel::Info,
        };
        let log_format = match (args.log_format, config.log_format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(raw)) => raw.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            (None, None) => LogFormat::Compact,
        };

        Ok(Self {
            snapshot_path: args.snapshot_path,
            output_path: args.output_path,
            release_id: args.release_id.map(|id| id.to_string()),
            verification_key: args.verification_key.or(config.verification_key),
            docker_config: args
                .docker_config
                .or(config.docker_config)
                .unwrap_or_else(default_docker_config),
            concurrency: args
                .concurrency
                .or(config.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY),
            retry_times: config.retry_times.unwrap_or(DEFAULT_RETRY_TIMES),
            cosign_bin: config
                .cosign_bin
                .unwrap_or_else(|| DEFAULT_COSIGN_BIN.to_string()),
            oras_bin: config
                .oras_bin
                .unwrap_or_else(|| DEFAULT_ORAS_BIN.to_string()),
            log_level,
            log_format,
        })
    }

    /// SBOMs are verified exactly when a verification key is configured.
    pub fn verify(&self) -> bool {
        self.verification_key.is_some()
    }
}

fn default_docker_config() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".docker")
        .join("config.json")
}
