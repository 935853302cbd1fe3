/// Use cases - Application business logic
mod build_snapshot;
mod enrich_sboms;

pub use build_snapshot::{construct_image, BuildSnapshotUseCase};
pub use enrich_sboms::EnrichSbomsUseCase;
