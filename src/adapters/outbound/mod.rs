/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod cosign;
pub mod filesystem;
pub mod process;
pub mod registry;
