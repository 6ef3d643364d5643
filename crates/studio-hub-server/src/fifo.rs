//! Named pipe setup for the broadcast service.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::process::Command;

/// Create the pipe at `path` unless something already lives there.
pub async fn ensure_named_pipe(path: &Path) -> Result<()> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => {
            if !is_fifo(&meta) {
                tracing::warn!(path = %path.display(), "pipe path exists but is not a fifo");
            }
            return Ok(());
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("stat pipe {:?}", path));
        }
    }

    let status = Command::new("mkfifo")
        .arg("-m")
        .arg("0666")
        .arg(path)
        .status()
        .await
        .context("spawn mkfifo")?;
    if !status.success() {
        return Err(anyhow::anyhow!("mkfifo {:?} exited with {status}", path));
    }
    tracing::info!(path = %path.display(), "created named pipe");
    Ok(())
}

#[cfg(unix)]
fn is_fifo(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    meta.file_type().is_fifo()
}

#[cfg(not(unix))]
fn is_fifo(_meta: &std::fs::Metadata) -> bool {
    false
}
