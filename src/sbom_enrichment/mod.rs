/// Release image model, purl codec and provenance parsing.
pub mod domain;
/// SPDX and CycloneDX document rewriting.
pub mod handlers;
