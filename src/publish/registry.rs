//! Package registry upload through a configured command.

use crate::error::{PublishError, Result};
use crate::process::{RunError, output_with_timeout};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Run the registry upload command (e.g. `poetry publish`) in `root`.
///
/// The command is run as-is; credentials come from the environment the
/// workflow provides. It is killed after `timeout`.
pub async fn run_registry_upload(command: &[String], root: &Path, timeout: Duration) -> Result<()> {
    let (program, args) = command.split_first().ok_or_else(|| PublishError::RegistryFailed {
        command: String::new(),
        reason: "publish.command is empty".to_string(),
    })?;
    let command_line = command.join(" ");

    if which::which(program).is_err() {
        return Err(PublishError::RegistryFailed {
            command: command_line,
            reason: format!("'{}' not found on PATH", program),
        }
        .into());
    }

    log::info!("Running registry upload: {}", command_line);
    let mut child = Command::new(program);
    child.args(args).current_dir(root);
    let output = output_with_timeout(child, timeout)
        .await
        .map_err(|e| PublishError::RegistryFailed {
            command: command_line.clone(),
            reason: match e {
                RunError::TimedOut => format!("timed out after {}s", timeout.as_secs()),
                RunError::Io(e) => e.to_string(),
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PublishError::RegistryFailed {
            command: command_line,
            reason: format!("{}: {}", output.status, stderr.trim()),
        }
        .into());
    }

    Ok(())
}
