use clap::Parser;
use std::path::PathBuf;
use uuid::Uuid;

use crate::logging::{LogFormat, LogLevel};

/// Rewrite release image SBOMs with their published registry coordinates
#[derive(Parser, Debug)]
#[command(name = "release-sbom")]
#[command(version)]
#[command(
    about = "Rewrite release image SBOMs with their published registry coordinates",
    long_about = None
)]
pub struct Args {
    /// Path to the release snapshot JSON
    #[arg(long, value_name = "FILE")]
    pub snapshot_path: PathBuf,

    /// Directory the SBOMs are downloaded to and rewritten in
    #[arg(long, value_name = "DIR")]
    pub output_path: PathBuf,

    /// Release identifier to record in every SBOM
    #[arg(long, value_name = "UUID")]
    pub release_id: Option<Uuid>,

    /// Public key for attestation verification; enables SBOM verification
    #[arg(long, value_name = "FILE")]
    pub verification_key: Option<PathBuf>,

    /// Docker config holding registry credentials [default: ~/.docker/config.json]
    #[arg(long, value_name = "FILE")]
    pub docker_config: Option<PathBuf>,

    /// Maximum number of SBOMs processed at once [default: 8]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(usize))]
    pub concurrency: Option<usize>,

    /// Path to a config file (defaults to release-sbom.config.yml in the current directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level [default: info]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Log output format [default: compact]
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
