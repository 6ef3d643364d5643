//! System output volume control via `wpctl`.

use std::time::Duration;

use async_trait::async_trait;

use crate::process::{run_command, CollaboratorError};

const DEFAULT_SINK: &str = "@DEFAULT_AUDIO_SINK@";

#[async_trait]
pub trait VolumeController: Send + Sync {
    /// Set the default sink volume in percent. Values are passed through unchecked.
    async fn set_volume(&self, percent: i64) -> Result<(), CollaboratorError>;
}

/// PipeWire sink controller.
pub struct WpctlVolume {
    program: String,
    timeout: Duration,
}

impl WpctlVolume {
    pub fn new(program: String, timeout: Duration) -> Self {
        Self { program, timeout }
    }
}

#[async_trait]
impl VolumeController for WpctlVolume {
    async fn set_volume(&self, percent: i64) -> Result<(), CollaboratorError> {
        let level = format!("{percent}%");
        run_command(
            &self.program,
            ["set-volume", DEFAULT_SINK, level.as_str()],
            self.timeout,
        )
        .await?;
        tracing::info!(volume = percent, "sink volume updated");
        Ok(())
    }
}
