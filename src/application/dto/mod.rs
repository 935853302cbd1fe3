/// Data Transfer Objects for application layer
///
/// DTOs carry the release snapshot and run options into the use cases and
/// results back out, keeping the domain layer isolated.
mod enrich_request;
mod enrich_response;
mod snapshot_spec;

pub use enrich_request::EnrichRequest;
pub use enrich_response::{EnrichResponse, EnrichedSbom};
pub use snapshot_spec::{ComponentSpec, SnapshotSpec};
