mod cli;
mod config;
mod logging;

use cli::Args;
use config::{discover_config, load_config_from_path, Settings};
use release_sbom::prelude::*;
use release_sbom::shared::error::{ExitCode, SbomError};
use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    // clap exits with code 2 on invalid arguments
    let args = Args::parse_args();

    match run(args).await {
        Ok(()) => process::exit(ExitCode::Success.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            for cause in e.chain().skip(1) {
                eprintln!("\nCaused by: {}", cause);
            }

            eprintln!();
            process::exit(ExitCode::from_error(&e).as_i32());
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match args.config.as_deref() {
        Some(path) => Some(load_config_from_path(path)?),
        None => discover_config(&std::env::current_dir()?)?,
    };
    let settings = Settings::resolve(args, config)?;

    logging::init_tracing(settings.log_format, settings.log_level)?;

    let spec = SnapshotSpec::load(&settings.snapshot_path)?;
    prepare_output_dir(&settings.output_path)?;

    // Create adapters (Dependency Injection)
    let manifest_fetcher = OrasManifestFetcher::new(settings.docker_config.clone())
        .with_binary(settings.oras_bin.clone())
        .with_retry_times(settings.retry_times);
    let path_locks = PathLocks::new();
    let provenance_client = CosignClient::new(settings.docker_config.clone())
        .with_binary(settings.cosign_bin.clone())
        .with_verification_key(settings.verification_key.clone())
        .with_retry_times(settings.retry_times)
        .with_path_locks(path_locks.clone());
    let store = FileSystemSbomStore::with_locks(path_locks);

    let snapshot = BuildSnapshotUseCase::new(manifest_fetcher)
        .execute(&spec)
        .await?;

    if !settings.verify() {
        tracing::warn!("No verification key configured, SBOMs will not be verified");
    }

    let request = EnrichRequest::new(
        settings.output_path.clone(),
        settings.release_id.clone(),
        settings.verify(),
        settings.concurrency,
    );
    let response = EnrichSbomsUseCase::new(provenance_client, store)
        .execute(&snapshot, &request)
        .await?;

    eprintln!(
        "✅ Enriched {} SBOM(s) in {}",
        response.len(),
        settings.output_path.display()
    );
    Ok(())
}

fn prepare_output_dir(path: &Path) -> Result<()> {
    if let Ok(metadata) = std::fs::symlink_metadata(path) {
        if metadata.is_symlink() {
            return Err(SbomError::FileWriteError {
                path: path.to_path_buf(),
                details: "Security: Output path is a symbolic link. For security reasons, writing to symbolic links is not allowed.".to_string(),
            }
            .into());
        }
        if !metadata.is_dir() {
            return Err(SbomError::FileWriteError {
                path: path.to_path_buf(),
                details: "Output path exists and is not a directory".to_string(),
            }
            .into());
        }
        return Ok(());
    }

    std::fs::create_dir_all(path).map_err(|e| {
        SbomError::FileWriteError {
            path: path.to_path_buf(),
            details: e.to_string(),
        }
        .into()
    })
}
