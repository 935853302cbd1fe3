use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum size of an SBOM or release snapshot we are willing to load (100 MB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validates that a path exists and is a regular file, not a symlink.
///
/// `symlink_metadata()` is used so the link itself is inspected rather
/// than its target.
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {} metadata: {}", file_description, e))?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, symbolic links are not allowed.",
            path.display()
        );
    }

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    if metadata.len() > MAX_FILE_SIZE {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            metadata.len(),
            MAX_FILE_SIZE
        );
    }

    Ok(())
}

/// Rejects writes through an existing symlink. A missing path is fine.
pub fn validate_write_target(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_symlink() => anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, writing to symbolic links is not allowed.",
            path.display()
        ),
        _ => Ok(()),
    }
}

/// Turns a component name into a single safe path segment.
pub fn sanitize_path_segment(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => format!("_{}", sanitized),
        _ => sanitized,
    }
}
