//! SPDX 2.x enrichment.
//!
//! The image package is found by its SHA-256 checksum. Its OCI purl
//! external references are replaced by one purl per release tag, and for
//! an index the child packages get the same treatment while keeping the
//! architecture recorded in their original purl.

use crate::sbom_enrichment::domain::{
    construct_purl, get_purl_arch, is_oci_purl, make_reference, without_sha_header, Component,
    IndexImage, PackageUrl, ReleaseImage,
};
use crate::shared::error::SbomError;
use crate::shared::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SUPPORTED_VERSIONS: &[&str] = &[
    "SPDX-2.0",
    "SPDX-2.1",
    "SPDX-2.2",
    "SPDX-2.2.1",
    "SPDX-2.2.2",
    "SPDX-2.3",
];

const ANNOTATOR: &str = "Tool: release-sbom";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SpdxDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    packages: Option<Vec<SpdxPackage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotations: Option<Vec<SpdxAnnotation>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SpdxPackage {
    #[serde(rename = "SPDXID", default, skip_serializing_if = "Option::is_none")]
    spdx_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksums: Option<Vec<SpdxChecksum>>,
    #[serde(
        rename = "externalRefs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    external_refs: Option<Vec<SpdxExternalRef>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SpdxChecksum {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<String>,
    #[serde(
        rename = "checksumValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    checksum_value: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SpdxExternalRef {
    #[serde(
        rename = "referenceCategory",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    reference_category: Option<String>,
    #[serde(
        rename = "referenceType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    reference_type: Option<String>,
    #[serde(
        rename = "referenceLocator",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    reference_locator: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SpdxAnnotation {
    #[serde(
        rename = "annotationDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    annotation_date: Option<String>,
    #[serde(
        rename = "annotationType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    annotation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl SpdxExternalRef {
    fn purl(purl: String) -> Self {
        Self {
            reference_category: Some("PACKAGE-MANAGER".to_string()),
            reference_type: Some("purl".to_string()),
            reference_locator: Some(purl),
            extra: Map::new(),
        }
    }

    /// The locator of a `purl` typed reference.
    fn purl_locator(&self) -> Option<&str> {
        if self.reference_type.as_deref() != Some("purl") {
            return None;
        }
        self.reference_locator.as_deref()
    }

    fn is_oci_purl(&self) -> bool {
        self.purl_locator().is_some_and(is_oci_purl)
    }
}

impl SpdxPackage {
    fn id(&self) -> &str {
        self.spdx_id.as_deref().unwrap_or("UNKNOWN")
    }

    fn sha256_checksum(&self) -> Option<&str> {
        self.checksums
            .as_deref()?
            .iter()
            .find(|checksum| checksum.algorithm.as_deref() == Some("SHA256"))
            .and_then(|checksum| checksum.checksum_value.as_deref())
    }

    fn describes(&self, digest: &str) -> bool {
        self.sha256_checksum()
            .is_some_and(|checksum| checksum.eq_ignore_ascii_case(without_sha_header(digest)))
    }

    /// Finds an existing OCI purl whose version is `digest`.
    fn find_oci_purl(&self, digest: &str) -> Option<String> {
        self.external_refs
            .iter()
            .flatten()
            .filter_map(SpdxExternalRef::purl_locator)
            .filter_map(|locator| PackageUrl::parse(locator).ok())
            .find(|purl| purl.is_oci() && purl.version() == Some(digest))
            .map(|purl| purl.to_string())
    }

    /// Drops every OCI purl reference and prepends fresh ones, one per tag.
    /// Other references keep their relative order.
    fn replace_oci_purls(
        &mut self,
        repository: &str,
        digest: &str,
        tags: &[Option<&str>],
        arch: Option<&str>,
    ) {
        let fresh = tags
            .iter()
            .map(|tag| SpdxExternalRef::purl(construct_purl(repository, digest, arch, *tag)));
        let kept = self
            .external_refs
            .take()
            .unwrap_or_default()
            .into_iter()
            .filter(|reference| !reference.is_oci_purl());

        self.external_refs = Some(fresh.chain(kept).collect());
    }
}

impl SpdxDocument {
    fn find_package_mut(&mut self, digest: &str) -> Option<&mut SpdxPackage> {
        self.packages
            .iter_mut()
            .flatten()
            .find(|package| package.describes(digest))
    }
}

/// Returns true if the document declares a supported SPDX 2.x version.
pub fn supports(sbom: &Value) -> bool {
    let Some(raw) = sbom.get("spdxVersion") else {
        return false;
    };

    match raw.as_str() {
        Some(version) if SUPPORTED_VERSIONS.contains(&version) => true,
        _ => {
            tracing::warn!(spdx_version = %raw, "SPDX spec version not recognized");
            false
        }
    }
}

/// Rewrites the image package (and index children) of an SPDX document in
/// place. On error the document is left untouched.
pub fn update_sbom(component: &Component, image: &ReleaseImage, sbom: &mut Value) -> Result<()> {
    let mut document: SpdxDocument = serde_json::from_value(sbom.clone())
        .map_err(|e| SbomError::format(format!("invalid SPDX document: {}", e)))?;

    update_image_package(component, image.digest(), &mut document)?;
    if let ReleaseImage::Index(index) = image {
        update_index_children(component, index, &mut document);
    }

    *sbom = serde_json::to_value(&document)?;
    Ok(())
}

fn update_image_package(
    component: &Component,
    digest: &str,
    document: &mut SpdxDocument,
) -> Result<()> {
    let package = document
        .find_package_mut(digest)
        .ok_or_else(|| SbomError::PackageNotFound {
            digest: digest.to_string(),
        })?;

    package.replace_oci_purls(component.repository(), digest, &component.purl_tags(), None);
    document.name = Some(make_reference(component.repository(), digest));
    Ok(())
}

fn update_index_children(component: &Component, index: &IndexImage, document: &mut SpdxDocument) {
    let tags = component.purl_tags();

    for child in index.children() {
        let Some(package) = document.find_package_mut(child.digest()) else {
            tracing::warn!(
                digest = child.digest(),
                index = index.digest(),
                "Could not find SPDX package for index child"
            );
            continue;
        };

        let Some(original_purl) = package.find_oci_purl(child.digest()) else {
            tracing::warn!(
                digest = child.digest(),
                package = package.id(),
                index = index.digest(),
                "Could not find OCI purl for index child, architecture unknown"
            );
            continue;
        };

        let arch = get_purl_arch(&original_purl);
        package.replace_oci_purls(component.repository(), child.digest(), &tags, arch.as_deref());
    }
}

/// Records the release id as a document annotation, once.
pub fn annotate_release(sbom: &mut Value, release_id: &str) -> Result<()> {
    annotate_release_at(sbom, release_id, Utc::now())
}

pub(crate) fn annotate_release_at(
    sbom: &mut Value,
    release_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut document: SpdxDocument = serde_json::from_value(sbom.clone())
        .map_err(|e| SbomError::format(format!("invalid SPDX document: {}", e)))?;

    let comment = format!("release_id={}", release_id);
    let annotations = document.annotations.get_or_insert_with(Vec::new);
    if annotations
        .iter()
        .any(|annotation| annotation.comment.as_deref() == Some(comment.as_str()))
    {
        return Ok(());
    }

    annotations.push(SpdxAnnotation {
        annotation_date: Some(now.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        annotation_type: Some("OTHER".to_string()),
        annotator: Some(ANNOTATOR.to_string()),
        comment: Some(comment),
        extra: Map::new(),
    });

    *sbom = serde_json::to_value(&document)?;
    Ok(())
}
