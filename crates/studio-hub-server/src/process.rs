//! Collaborator process execution.
//!
//! Runs external binaries to completion under a deadline and classifies
//! failures so callers can tell a missing tool from a broken one.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

/// Failure of an external collaborator (search tool, sink controller, launcher).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Binary missing or could not be spawned.
    #[error("{program} unavailable: {reason}")]
    Unavailable { program: String, reason: String },
    /// Did not finish before the deadline; the child was killed.
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    /// Exited with a non-zero status.
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    /// Produced output that could not be interpreted.
    #[error("{program} returned malformed output: {reason}")]
    MalformedOutput { program: String, reason: String },
}

impl CollaboratorError {
    /// Stable snake_case label used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CollaboratorError::Unavailable { .. } => "collaborator_unavailable",
            CollaboratorError::Timeout { .. } => "collaborator_timeout",
            CollaboratorError::Failed { .. } => "collaborator_failed",
            CollaboratorError::MalformedOutput { .. } => "malformed_collaborator_output",
        }
    }
}

/// Classify a spawn error for `program`.
pub fn spawn_error(program: &str, err: std::io::Error) -> CollaboratorError {
    let reason = if err.kind() == std::io::ErrorKind::NotFound {
        "not installed or not on PATH".to_string()
    } else {
        err.to_string()
    };
    CollaboratorError::Unavailable {
        program: program.to_string(),
        reason,
    }
}

/// Run `program` with `args`, returning stdout on success.
pub async fn run_command<I, S>(
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<String, CollaboratorError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| spawn_error(program, err))?;

    // Dropping the future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|err| CollaboratorError::Unavailable {
            program: program.to_string(),
            reason: err.to_string(),
        })?,
        Err(_) => {
            tracing::warn!(
                program,
                timeout_ms = timeout.as_millis() as u64,
                "collaborator timed out"
            );
            return Err(CollaboratorError::Timeout {
                program: program.to_string(),
                timeout,
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::warn!(program, status = %output.status, stderr = %stderr, "collaborator failed");
        return Err(CollaboratorError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }

    String::from_utf8(output.stdout).map_err(|err| CollaboratorError::MalformedOutput {
        program: program.to_string(),
        reason: err.to_string(),
    })
}
