/// Result alias used across the crate. Typed failures are `SbomError`
/// values wrapped in `anyhow::Error` and recovered with `downcast_ref`.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
