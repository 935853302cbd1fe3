use crate::shared::error::SbomError;
use crate::shared::Result;
use sha2::{Digest, Sha256};

pub const SHA256_PREFIX: &str = "sha256:";

/// Builds `<repository>@<digest>`.
pub fn make_reference(repository: &str, digest: &str) -> String {
    format!("{}@{}", repository, digest)
}

/// Strips the `sha256:` header, as SPDX checksums carry bare hex.
pub fn without_sha_header(digest: &str) -> &str {
    digest.strip_prefix(SHA256_PREFIX).unwrap_or(digest)
}

/// Returns true for `sha256:` followed by one or more lowercase hex digits.
pub fn is_sha256_digest(digest: &str) -> bool {
    match digest.strip_prefix(SHA256_PREFIX) {
        Some(hex) => !hex.is_empty() && hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')),
        None => false,
    }
}

/// Digest of `content` in `sha256:<hex>` form.
pub fn sha256_digest(content: &[u8]) -> String {
    format!("{}{}", SHA256_PREFIX, hex::encode(Sha256::digest(content)))
}

/// Splits a digest reference `repository@sha256:<hex>` into its parts.
///
/// Registry ports are not supported: the repository must not contain `:`.
pub fn split_digest_reference(reference: &str) -> Result<(&str, &str)> {
    let invalid = |reason: &str| SbomError::InvalidReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    };

    let (repository, digest) = reference
        .split_once('@')
        .ok_or_else(|| invalid("missing '@<digest>'"))?;

    if repository.is_empty() || repository.contains(':') {
        return Err(invalid("repository must be non-empty and must not contain ':'").into());
    }

    if !is_sha256_digest(digest) {
        return Err(invalid("digest must be sha256:<lowercase hex>").into());
    }

    Ok((repository, digest))
}

/// Returns the digest portion of a digest reference.
pub fn reference_digest(reference: &str) -> Result<&str> {
    split_digest_reference(reference).map(|(_, digest)| digest)
}
