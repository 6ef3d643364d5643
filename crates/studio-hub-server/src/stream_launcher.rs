//! Stream launcher abstraction for feeding the broadcast pipe.
//!
//! Implementations start the audio writer for a track and tear down the
//! previous one so the named pipe never has two writers.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use tokio::process::{Child, Command};

use crate::models::Track;
use crate::process::{spawn_error, CollaboratorError};

/// Shell wrapper so the blocking FIFO open happens in the child. The binary,
/// URL and pipe path arrive as `$0`, `$1` and `$2`.
const PIPE_SCRIPT: &str = r#"exec "$0" -f bestaudio -o - "$1" > "$2""#;

pub trait StreamLauncher: Send + Sync {
    /// Stop any running stream, then start streaming `track` into the pipe.
    ///
    /// Returns once the writer process is spawned.
    fn launch(&self, track: &Track) -> Result<(), CollaboratorError>;
    /// Stop the running stream, if any.
    fn stop(&self);
}

/// Launches `yt-dlp` with its stdout redirected into the named pipe.
pub struct PipeLauncher {
    program: String,
    fifo_path: PathBuf,
    child: Mutex<Option<Child>>,
}

impl PipeLauncher {
    pub fn new(program: String, fifo_path: PathBuf) -> Self {
        Self {
            program,
            fifo_path,
            child: Mutex::new(None),
        }
    }

    /// Kill the writer and everything it spawned, then reap it if it is done.
    fn kill(child: &mut Child) {
        let Some(pid) = child.id() else {
            return;
        };
        match kill_group(pid) {
            Ok(()) => tracing::info!(pid, "stream writer stopped"),
            Err(err) => {
                tracing::warn!(pid, error = %err, "failed to signal stream writer group");
                if let Err(err) = child.start_kill() {
                    tracing::warn!(pid, error = %err, "failed to kill stream writer");
                }
            }
        }
        if let Ok(Some(status)) = child.try_wait() {
            tracing::debug!(pid, status = %status, "stream writer reaped");
        }
    }
}

/// The writer leads its own process group, so helpers it forks (ffmpeg, wrapper
/// scripts) are signalled with it. A group that is already gone is not an error.
#[cfg(unix)]
fn kill_group(pid: u32) -> std::io::Result<()> {
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "process groups are unix-only",
    ))
}

impl StreamLauncher for PipeLauncher {
    fn launch(&self, track: &Track) -> Result<(), CollaboratorError> {
        let mut slot = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut previous) = slot.take() {
            Self::kill(&mut previous);
        }

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(PIPE_SCRIPT)
            .arg(&self.program)
            .arg(&track.url)
            .arg(&self.fifo_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        let child = command.spawn().map_err(|err| spawn_error("sh", err))?;

        tracing::info!(
            title = track.title.as_deref().unwrap_or("-"),
            user = track.user.as_deref().unwrap_or("-"),
            url = %track.url,
            pid = ?child.id(),
            fifo = %self.fifo_path.display(),
            "now broadcasting"
        );
        *slot = Some(child);
        Ok(())
    }

    fn stop(&self) {
        let mut slot = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut child) = slot.take() {
            Self::kill(&mut child);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn track(url: &str) -> Track {
        Track {
            title: Some("A".to_string()),
            url: url.to_string(),
            user: Some("alice".to_string()),
            id: 1,
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "studio-hub-{name}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Stand-in for yt-dlp that forks a helper which keeps writing the URL
    /// (the fifth argument) to stdout until killed.
    fn forking_writer(dir: &std::path::Path) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("writer.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\nsh -c 'while :; do echo \"$0\"; sleep 0.05; done' \"$5\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.display().to_string()
    }

    async fn settle() {
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    }

    fn output_len(path: &std::path::Path) -> u64 {
        std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }

    #[actix_web::test]
    async fn launch_kills_previous_writer_and_its_helpers() {
        let dir = scratch_dir("launcher");
        let out = dir.join("out");
        let launcher = PipeLauncher::new(forking_writer(&dir), out.clone());

        launcher.launch(&track("first-url")).unwrap();
        settle().await;
        assert!(std::fs::read_to_string(&out).unwrap().contains("first-url"));

        // The new writer truncates the output; anything left of the first
        // writer would append its URL again.
        launcher.launch(&track("second-url")).unwrap();
        settle().await;
        settle().await;
        let contents = std::fs::read_to_string(&out).unwrap();
        assert!(contents.contains("second-url"));
        assert!(!contents.contains("first-url"));

        launcher.stop();
        assert!(launcher.child.lock().unwrap().is_none());
    }

    #[actix_web::test]
    async fn stop_silences_writer_and_its_helpers() {
        let dir = scratch_dir("stop");
        let out = dir.join("out");
        let launcher = PipeLauncher::new(forking_writer(&dir), out.clone());

        launcher.launch(&track("u1")).unwrap();
        settle().await;
        assert!(output_len(&out) > 0);

        launcher.stop();
        settle().await;
        let stopped_at = output_len(&out);
        settle().await;
        settle().await;
        assert_eq!(output_len(&out), stopped_at);
    }

    #[test]
    fn stop_without_stream_is_noop() {
        let launcher = PipeLauncher::new("yt-dlp".to_string(), PathBuf::from("/tmp/unused"));
        launcher.stop();
        assert!(launcher.child.lock().unwrap().is_none());
    }
}
