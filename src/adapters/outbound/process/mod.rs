/// External command execution and the credentials handed to it
mod auth;
mod runner;

pub use auth::ScopedRegistryAuth;
pub use runner::{run_async_subprocess, ProcessOutput, DEFAULT_RETRY_TIMES};
