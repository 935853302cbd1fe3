pub mod component;
pub mod image;
pub mod provenance;
pub mod purl;
pub mod reference;

pub use component::{Component, Snapshot};
pub use image::{Image, IndexImage, ReleaseImage};
pub use provenance::{latest_provenance, Provenance02};
pub use purl::{construct_purl, get_purl_arch, get_purl_digest, is_oci_purl, PackageUrl};
pub use reference::{
    is_sha256_digest, make_reference, reference_digest, sha256_digest, split_digest_reference,
    without_sha_header,
};
