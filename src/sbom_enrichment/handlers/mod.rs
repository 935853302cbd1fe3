//! Format-specific SBOM rewriting.

pub mod cyclonedx1;
pub mod spdx2;

use crate::sbom_enrichment::domain::{Component, ReleaseImage};
use crate::shared::Result;
use serde_json::Value;
use std::fmt;

/// The SBOM document formats that can be enriched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbomFormat {
    Spdx2,
    CycloneDx1,
}

impl SbomFormat {
    pub const ALL: [SbomFormat; 2] = [SbomFormat::Spdx2, SbomFormat::CycloneDx1];

    /// Returns the first format that recognizes the document.
    pub fn detect(sbom: &Value) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.supports(sbom))
    }

    pub fn supports(self, sbom: &Value) -> bool {
        match self {
            SbomFormat::Spdx2 => spdx2::supports(sbom),
            SbomFormat::CycloneDx1 => cyclonedx1::supports(sbom),
        }
    }

    /// Rewrites image identity fields of `sbom` to the released coordinates
    /// of `component`. Running it twice yields the same document.
    pub fn update_sbom(
        self,
        component: &Component,
        image: &ReleaseImage,
        sbom: &mut Value,
    ) -> Result<()> {
        match self {
            SbomFormat::Spdx2 => spdx2::update_sbom(component, image, sbom),
            SbomFormat::CycloneDx1 => cyclonedx1::update_sbom(component, image, sbom),
        }
    }

    pub fn annotate_release(self, sbom: &mut Value, release_id: &str) -> Result<()> {
        match self {
            SbomFormat::Spdx2 => spdx2::annotate_release(sbom, release_id),
            SbomFormat::CycloneDx1 => cyclonedx1::annotate_release(sbom, release_id),
        }
    }
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SbomFormat::Spdx2 => write!(f, "SPDX 2.x"),
            SbomFormat::CycloneDx1 => write!(f, "CycloneDX 1.x"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect() {
        assert_eq!(
            SbomFormat::detect(&json!({ "spdxVersion": "SPDX-2.3" })),
            Some(SbomFormat::Spdx2)
        );
        assert_eq!(
            SbomFormat::detect(&json!({ "bomFormat": "CycloneDX", "specVersion": "1.6" })),
            Some(SbomFormat::CycloneDx1)
        );
        assert_eq!(SbomFormat::detect(&json!({ "spdxVersion": "SPDX-9.9" })), None);
        assert_eq!(SbomFormat::detect(&json!({})), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(SbomFormat::Spdx2.to_string(), "SPDX 2.x");
        assert_eq!(SbomFormat::CycloneDx1.to_string(), "CycloneDX 1.x");
    }
}
