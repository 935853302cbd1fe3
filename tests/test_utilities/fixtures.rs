use release_sbom::prelude::*;
use serde_json::{json, Value};

/// A provenance whose build recorded `sbom_digest` as the SBOM of
/// `image_digest`.
pub fn provenance(image_digest: &str, sbom_digest: &str, finished_on: &str) -> Provenance02 {
    Provenance02::new(json!({
        "metadata": { "buildFinishedOn": finished_on },
        "buildConfig": {
            "tasks": [
                { "name": "build-container", "results": [
                    { "name": "IMAGE_DIGEST", "value": image_digest },
                    { "name": "SBOM_BLOB_URL", "value": format!("quay.io/build/sboms@{}", sbom_digest) },
                ]},
            ],
        },
    }))
}

pub fn spdx_package(id: &str, hex: &str, purl: &str) -> Value {
    json!({
        "SPDXID": id,
        "name": id,
        "checksums": [{ "algorithm": "SHA256", "checksumValue": hex }],
        "externalRefs": [{
            "referenceCategory": "PACKAGE-MANAGER",
            "referenceType": "purl",
            "referenceLocator": purl,
        }],
    })
}

pub fn spdx_sbom(packages: Vec<Value>) -> Value {
    json!({
        "spdxVersion": "SPDX-2.3",
        "SPDXID": "SPDXRef-DOCUMENT",
        "dataLicense": "CC0-1.0",
        "name": "build",
        "packages": packages,
    })
}

pub fn cyclonedx_sbom(image_purl: &str) -> Value {
    json!({
        "bomFormat": "CycloneDX",
        "specVersion": "1.5",
        "version": 1,
        "metadata": {
            "component": { "type": "container", "name": "image", "purl": image_purl },
        },
        "components": [
            { "type": "container", "name": "image", "purl": image_purl },
            { "type": "library", "name": "openssl", "purl": "pkg:rpm/redhat/openssl@3.0.7" },
        ],
    })
}

pub fn bytes(document: &Value) -> Vec<u8> {
    serde_json::to_vec(document).unwrap()
}
