use crate::shared::Result;
use std::collections::HashMap;
use tokio::process::Command;

/// Retries used for registry commands unless configured otherwise.
pub const DEFAULT_RETRY_TIMES: u32 = 3;

/// Exit code and captured output of one external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was terminated by a signal
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs `cmd` up to `1 + retry_times` times, stopping at the first zero
/// exit code. Returns the last attempt when every attempt fails.
///
/// `env` is added on top of the inherited environment. Attempts are not
/// spaced out, and there is no timeout: a hung command blocks the caller.
///
/// # Errors
/// Only when the command cannot be started at all. A non-zero exit is
/// reported through [`ProcessOutput::code`].
pub async fn run_async_subprocess(
    cmd: &[String],
    env: Option<&HashMap<String, String>>,
    retry_times: u32,
) -> Result<ProcessOutput> {
    let (program, args) = cmd
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Cannot run an empty command"))?;

    let mut attempt = 0;
    loop {
        attempt += 1;

        let mut command = Command::new(program);
        command.args(args);
        if let Some(env) = env {
            command.envs(env);
        }

        let output = command
            .output()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to execute command '{}': {}", program, e))?;

        let result = ProcessOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        };

        if result.success() || attempt > retry_times {
            return Ok(result);
        }

        tracing::debug!(
            command = %cmd.join(" "),
            code = result.code,
            attempt,
            "Command failed, retrying"
        );
    }
}
