use std::process::Output;

use tokio::process::Command;

use crate::error::{HelixTutorError, Result};

/// Runs `command` to completion. Failing to start it is a tool error; the
/// exit status is left to the caller.
pub(super) async fn run(command: &mut Command, program: &str) -> Result<Output> {
    let output = command
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HelixTutorError::tool(program, "not found on PATH. Is it installed?")
            } else {
                HelixTutorError::tool(program, e)
            }
        })?;

    if !output.stderr.is_empty() {
        tracing::debug!("{} stderr: {}", program, String::from_utf8_lossy(&output.stderr).trim());
    }
    Ok(output)
}

pub(super) fn failure(program: &str, output: &Output) -> HelixTutorError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let last = stderr.lines().last().unwrap_or("").trim().to_string();
    HelixTutorError::tool(program, format!("exited with {}: {last}", output.status))
}
