use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow release pipelines to tell a tampered SBOM apart from
/// an infrastructure failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - every SBOM was enriched and saved
    Success = 0,
    /// An SBOM did not match the digest recorded in its provenance
    VerificationFailed = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (failed command, unsupported SBOM, file I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Picks the exit code for an error returned from the application.
    pub fn from_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<SbomError>() {
            Some(SbomError::Verification { .. }) => ExitCode::VerificationFailed,
            _ => ExitCode::ApplicationError,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::VerificationFailed => write!(f, "Verification Failed (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Errors raised while resolving release images and enriching their SBOMs.
///
/// Missing data about the image being enriched is always one of these.
/// Missing data about a secondary child or variant is logged and skipped
/// by the handlers instead.
#[derive(Debug, Error)]
pub enum SbomError {
    /// The SBOM contains a value that cannot be interpreted (SBOMFormatError)
    #[error("Invalid SBOM content: {details}")]
    Format { details: String },

    #[error("Could not find SBOM package for image {digest}\n\n💡 Hint: The SBOM does not describe the image it is attached to")]
    PackageNotFound { digest: String },

    #[error("Unsupported manifest mediaType for {reference}: {media_type}")]
    UnsupportedMediaType {
        reference: String,
        media_type: String,
    },

    #[error("Command '{command}' failed for {reference} with exit code {code}\nDetails: {stderr}")]
    CommandFailed {
        command: String,
        reference: String,
        code: i32,
        stderr: String,
    },

    #[error("No provenance attestations parsed for {reference}")]
    NoProvenance { reference: String },

    #[error("Provenance for {reference} does not record an SBOM blob for its digest")]
    SbomDigestNotFound { reference: String },

    /// The fetched SBOM differs from the one recorded in the provenance (SBOMVerificationError)
    #[error("SBOM verification failed for {reference}: expected digest {expected}, got {actual}\n\n💡 Hint: The SBOM in the registry was not produced by the attested build")]
    Verification {
        reference: String,
        expected: String,
        actual: String,
    },

    #[error("Unsupported SBOM format for image {reference}\n\n💡 Hint: Only SPDX 2.0-2.3 and CycloneDX 1.4-1.6 JSON documents are supported")]
    UnsupportedSbomFormat { reference: String },

    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Registry authentication unavailable: {path}\nReason: {reason}\n\n💡 Hint: Pass --docker-config or log in to the registry first")]
    RegistryAuth { path: PathBuf, reason: String },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl SbomError {
    pub fn format(details: impl Into<String>) -> Self {
        SbomError::Format {
            details: details.into(),
        }
    }
}
