//! Package URL codec for OCI images.
//!
//! Image identity is encoded as
//! `pkg:oci/<name>@<digest>?repository_url=<repository>[&arch=<arch>][&tag=<tag>]`
//! where `<name>` is the last path segment of the repository.

use crate::shared::error::SbomError;
use crate::shared::Result;
use std::fmt;

pub const OCI_PURL_TYPE: &str = "oci";

const QUALIFIER_REPOSITORY_URL: &str = "repository_url";
const QUALIFIER_ARCH: &str = "arch";
const QUALIFIER_TAG: &str = "tag";

/// A parsed package URL. Qualifiers keep their textual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageUrl {
    purl_type: String,
    namespace: Option<String>,
    name: String,
    version: Option<String>,
    qualifiers: Vec<(String, String)>,
    subpath: Option<String>,
}

impl PackageUrl {
    /// Creates an OCI purl for an image in `repository`.
    pub fn oci(repository: &str, digest: &str) -> Self {
        let name = repository.rsplit('/').next().unwrap_or(repository);
        Self {
            purl_type: OCI_PURL_TYPE.to_string(),
            namespace: None,
            name: name.to_string(),
            version: Some(digest.to_string()),
            qualifiers: vec![(QUALIFIER_REPOSITORY_URL.to_string(), repository.to_string())],
            subpath: None,
        }
    }

    /// Appends a qualifier; `None` values are omitted entirely.
    pub fn with_qualifier(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.qualifiers.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn parse(purl: &str) -> Result<Self> {
        let invalid = |reason: &str| SbomError::format(format!("invalid purl '{}': {}", purl, reason));

        let rest = purl
            .strip_prefix("pkg:")
            .ok_or_else(|| invalid("missing 'pkg:' scheme"))?;

        let (rest, subpath) = match rest.split_once('#') {
            Some((rest, subpath)) => (rest, Some(decode(subpath.trim_matches('/'))?)),
            None => (rest, None),
        };

        let (rest, raw_qualifiers) = match rest.split_once('?') {
            Some((rest, qualifiers)) => (rest, Some(qualifiers)),
            None => (rest, None),
        };

        let (path, version) = match rest.rsplit_once('@') {
            Some((path, version)) if !version.is_empty() => (path, Some(decode(version)?)),
            Some((path, _)) => (path, None),
            None => (rest, None),
        };

        let (purl_type, path) = path
            .trim_start_matches('/')
            .split_once('/')
            .ok_or_else(|| invalid("missing package name"))?;
        if purl_type.is_empty() {
            return Err(invalid("missing package type").into());
        }

        let path = path.trim_matches('/');
        let (namespace, name) = match path.rsplit_once('/') {
            Some((namespace, name)) => (Some(decode(namespace)?), name),
            None => (None, path),
        };
        if name.is_empty() {
            return Err(invalid("missing package name").into());
        }

        let mut qualifiers = Vec::new();
        for pair in raw_qualifiers.unwrap_or_default().split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            qualifiers.push((key.to_ascii_lowercase(), decode(value)?));
        }

        Ok(Self {
            purl_type: purl_type.to_ascii_lowercase(),
            namespace,
            name: decode(name)?,
            version,
            qualifiers,
            subpath,
        })
    }

    pub fn purl_type(&self) -> &str {
        &self.purl_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_oci(&self) -> bool {
        self.purl_type == OCI_PURL_TYPE
    }
}

impl fmt::Display for PackageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkg:{}/", self.purl_type)?;
        if let Some(namespace) = &self.namespace {
            let segments: Vec<String> = namespace.split('/').map(|s| encode(s, "")).collect();
            write!(f, "{}/", segments.join("/"))?;
        }
        write!(f, "{}", encode(&self.name, ""))?;
        if let Some(version) = &self.version {
            write!(f, "@{}", encode(version, ":"))?;
        }
        for (i, (key, value)) in self.qualifiers.iter().enumerate() {
            let separator = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", separator, key, encode(value, "/:"))?;
        }
        if let Some(subpath) = &self.subpath {
            write!(f, "#{}", subpath)?;
        }
        Ok(())
    }
}

/// Percent-encodes `value`, leaving the characters in `keep` literal.
fn encode(value: &str, keep: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut buf = [0u8; 4];
    for ch in value.chars() {
        if keep.contains(ch) {
            out.push(ch);
        } else {
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    out
}

fn decode(value: &str) -> Result<String> {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| SbomError::format(format!("invalid percent-encoding in '{}': {}", value, e)).into())
}

/// Constructs an OCI purl string from image coordinates.
pub fn construct_purl(
    repository: &str,
    digest: &str,
    arch: Option<&str>,
    tag: Option<&str>,
) -> String {
    PackageUrl::oci(repository, digest)
        .with_qualifier(QUALIFIER_ARCH, arch)
        .with_qualifier(QUALIFIER_TAG, tag)
        .to_string()
}

/// Returns the `arch` qualifier of a purl. Unparseable purls yield `None`
/// with a warning rather than an error.
pub fn get_purl_arch(purl: &str) -> Option<String> {
    match PackageUrl::parse(purl) {
        Ok(parsed) => parsed.qualifier(QUALIFIER_ARCH).map(str::to_string),
        Err(e) => {
            tracing::warn!(purl, error = %e, "Could not read qualifiers from purl");
            None
        }
    }
}

/// Returns the version (image digest) of a purl. A purl without a version
/// is not an image purl and fails with [`SbomError::Format`].
pub fn get_purl_digest(purl: &str) -> Result<String> {
    let parsed = PackageUrl::parse(purl)?;
    parsed
        .version()
        .map(str::to_string)
        .ok_or_else(|| SbomError::format(format!("SBOM contains invalid OCI purl: {}", purl)).into())
}

/// Returns true if `purl` parses and is of type `oci`.
pub fn is_oci_purl(purl: &str) -> bool {
    PackageUrl::parse(purl)
        .map(|parsed| parsed.is_oci())
        .unwrap_or(false)
}
