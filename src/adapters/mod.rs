/// Adapters layer - Infrastructure implementations
///
/// This layer contains concrete implementations of the ports, talking to
/// the cosign and oras CLIs and the local file system.
pub mod outbound;
