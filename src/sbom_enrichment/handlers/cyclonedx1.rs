//! CycloneDX 1.x enrichment.
//!
//! Documents are upgraded to 1.6 so that release tags beyond the first can
//! be recorded as `evidence.identity` entries.

use crate::sbom_enrichment::domain::{
    construct_purl, get_purl_arch, get_purl_digest, Component, ReleaseImage,
};
use crate::shared::error::SbomError;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SUPPORTED_VERSIONS: &[&str] = &["1.4", "1.5", "1.6"];

const BOM_FORMAT: &str = "CycloneDX";
const TARGET_VERSION: &str = "1.6";
const TARGET_SCHEMA: &str = "http://cyclonedx.org/schema/bom-1.6.schema.json";
const RELEASE_ID_PROPERTY: &str = "release_id";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CdxBom {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    #[serde(rename = "bomFormat", default, skip_serializing_if = "Option::is_none")]
    bom_format: Option<String>,
    #[serde(
        rename = "specVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    spec_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<CdxMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    components: Option<Vec<CdxComponent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<Vec<CdxProperty>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CdxMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    component: Option<CdxComponent>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CdxComponent {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    component_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evidence: Option<CdxEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pedigree: Option<CdxPedigree>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CdxEvidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<CdxIdentity>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// CycloneDX 1.5 allowed a single identity object; 1.6 uses a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum CdxIdentity {
    Many(Vec<CdxIdentityEntry>),
    One(CdxIdentityEntry),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CdxIdentityEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(
        rename = "concludedValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    concluded_value: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CdxPedigree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variants: Option<Vec<CdxComponent>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CdxProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl CdxIdentityEntry {
    fn purl(purl: String) -> Self {
        Self {
            field: Some("purl".to_string()),
            concluded_value: Some(purl),
            extra: Map::new(),
        }
    }

    fn same_purl(&self, other: &Self) -> bool {
        self.field == other.field && self.concluded_value == other.concluded_value
    }
}

impl CdxComponent {
    fn is_container(&self) -> bool {
        self.component_type.as_deref() == Some("container")
    }

    /// Appends purl identity entries that are not present yet. A single
    /// identity object is normalized to a list on first append.
    fn append_identities(&mut self, entries: Vec<CdxIdentityEntry>) {
        if entries.is_empty() {
            return;
        }

        let evidence = self.evidence.get_or_insert_with(CdxEvidence::default);
        let mut identities = match evidence.identity.take() {
            Some(CdxIdentity::Many(identities)) => identities,
            Some(CdxIdentity::One(identity)) => vec![identity],
            None => Vec::new(),
        };

        for entry in entries {
            if !identities.iter().any(|existing| existing.same_purl(&entry)) {
                identities.push(entry);
            }
        }

        evidence.identity = Some(CdxIdentity::Many(identities));
    }
}

impl CdxBom {
    fn bump_version(&mut self) -> Result<()> {
        match self.spec_version.as_deref() {
            Some(version) if SUPPORTED_VERSIONS.contains(&version) => {
                self.spec_version = Some(TARGET_VERSION.to_string());
                self.schema = Some(TARGET_SCHEMA.to_string());
                Ok(())
            }
            other => Err(SbomError::format(format!(
                "cannot upgrade CycloneDX specVersion {:?} to {}",
                other, TARGET_VERSION
            ))
            .into()),
        }
    }
}

/// Returns true for a CycloneDX document with a supported `specVersion`.
pub fn supports(sbom: &Value) -> bool {
    if sbom.get("bomFormat").and_then(Value::as_str) != Some(BOM_FORMAT) {
        return false;
    }

    let raw = sbom.get("specVersion").unwrap_or(&Value::Null);
    match raw.as_str() {
        Some(version) if SUPPORTED_VERSIONS.contains(&version) => true,
        _ => {
            tracing::warn!(spec_version = %raw, "CycloneDX spec version not recognized");
            false
        }
    }
}

/// Rewrites the image purls of a CycloneDX document in place. On error the
/// document is left untouched.
pub fn update_sbom(component: &Component, image: &ReleaseImage, sbom: &mut Value) -> Result<()> {
    let mut bom: CdxBom = serde_json::from_value(sbom.clone())
        .map_err(|e| SbomError::format(format!("invalid CycloneDX document: {}", e)))?;

    bom.bump_version()?;

    let metadata = bom.metadata.get_or_insert_with(CdxMetadata::default);
    if let Some(metadata_component) = metadata.component.as_mut() {
        update_container_component(component, metadata_component, false)?;
    }

    for cdx_component in bom.components.iter_mut().flatten() {
        update_component(component, image, cdx_component)?;
    }

    *sbom = serde_json::to_value(&bom)?;
    Ok(())
}

/// Updates a top-level component if its purl points at the released image,
/// then the index variants recorded in its pedigree.
fn update_component(
    component: &Component,
    image: &ReleaseImage,
    cdx_component: &mut CdxComponent,
) -> Result<()> {
    if !cdx_component.is_container() {
        return Ok(());
    }
    let Some(purl) = cdx_component.purl.as_deref() else {
        return Ok(());
    };
    // Other containers (base images) may carry versionless purls
    match get_purl_digest(purl) {
        Ok(digest) if digest == image.digest() => {}
        Ok(_) => return Ok(()),
        Err(e) => {
            tracing::warn!(purl, error = %e, "Skipping container component with unreadable purl");
            return Ok(());
        }
    }

    update_container_component(component, cdx_component, true)?;

    let Some(index) = image.as_index() else {
        return Ok(());
    };
    let variants = cdx_component
        .pedigree
        .as_mut()
        .and_then(|pedigree| pedigree.variants.as_mut());
    for variant in variants.into_iter().flatten() {
        let Some(purl) = variant.purl.as_deref() else {
            continue;
        };
        match get_purl_digest(purl) {
            Ok(digest) if index.has_child(&digest) => {
                update_container_component(component, variant, true)?;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(purl, error = %e, "Skipping index variant with unreadable purl");
            }
        }
    }

    Ok(())
}

/// Points a container component's purl at the destination repository using
/// the first release tag. With `with_identity`, each further tag is
/// recorded as an identity entry.
fn update_container_component(
    component: &Component,
    cdx_component: &mut CdxComponent,
    with_identity: bool,
) -> Result<()> {
    if !cdx_component.is_container() {
        tracing::warn!(
            component_type = ?cdx_component.component_type,
            "Called update method on non-container component"
        );
        return Ok(());
    }

    let Some(purl) = cdx_component.purl.as_deref() else {
        return Ok(());
    };

    let digest = get_purl_digest(purl)?;
    let arch = get_purl_arch(purl);
    let repository = component.repository();

    cdx_component.purl = Some(construct_purl(
        repository,
        &digest,
        arch.as_deref(),
        component.primary_tag(),
    ));

    if with_identity {
        let identities = component
            .tags()
            .iter()
            .skip(1)
            .map(|tag| {
                CdxIdentityEntry::purl(construct_purl(repository, &digest, arch.as_deref(), Some(tag)))
            })
            .collect();
        cdx_component.append_identities(identities);
    }

    Ok(())
}

/// Records the release id as a BOM property, once.
pub fn annotate_release(sbom: &mut Value, release_id: &str) -> Result<()> {
    let mut bom: CdxBom = serde_json::from_value(sbom.clone())
        .map_err(|e| SbomError::format(format!("invalid CycloneDX document: {}", e)))?;

    let properties = bom.properties.get_or_insert_with(Vec::new);
    let exists = properties.iter().any(|property| {
        property.name.as_deref() == Some(RELEASE_ID_PROPERTY)
            && property.value.as_deref() == Some(release_id)
    });
    if !exists {
        properties.push(CdxProperty {
            name: Some(RELEASE_ID_PROPERTY.to_string()),
            value: Some(release_id.to_string()),
            extra: Map::new(),
        });
    }

    *sbom = serde_json::to_value(&bom)?;
    Ok(())
}
