//! External commands with a deadline.
//!
//! Build backends and registry uploaders fork helpers of their own (poetry
//! runs python, python runs pip). On unix each command gets its own process
//! group so a timeout takes the whole tree down, not just the direct child.

use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Why a command produced no output
#[derive(Error, Debug)]
pub enum RunError {
    /// Spawning or waiting failed
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The deadline passed and the process group was killed
    #[error("timed out")]
    TimedOut,
}

/// Run `command` to completion, capturing stdout and stderr.
///
/// stdin is closed. When `timeout` passes first, every process in the
/// command's group is killed.
pub async fn output_with_timeout(mut command: Command, timeout: Duration) -> Result<Output, RunError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let child = command.spawn().map_err(RunError::Io)?;
    let pid = child.id();

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output.map_err(RunError::Io),
        Err(_) => {
            kill_process_group(pid);
            Err(RunError::TimedOut)
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        log::debug!("killpg({}) failed: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
