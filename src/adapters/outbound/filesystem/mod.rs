/// Filesystem adapters for SBOM documents
mod path_locks;
mod sbom_store;

pub use path_locks::PathLocks;
pub use sbom_store::FileSystemSbomStore;
