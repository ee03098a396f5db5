//! Audio playback is delegated to an external player process (ffplay by
//! default). The session only starts it and watches for an early failure;
//! there is no feedback from the audio clock into frame pacing.

use std::fs::File;
use std::path::Path;
use std::process::{Child, Command as ProcCommand, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::{PlayError, Result};

/// Something that can start playing an audio file in the background.
pub trait AudioOutput {
    fn start(&self, path: &Path) -> Result<AudioHandle>;
}

/// Running playback. Dropping the handle stops it.
#[derive(Debug, Default)]
pub struct AudioHandle {
    child: Option<Child>,
}

impl AudioHandle {
    pub fn detached() -> Self {
        Self { child: None }
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) if !status.success() => warn!("audio player exited with {}", status),
            Ok(Some(_)) => {}
            _ => {
                debug!("stopping audio player");
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }
}

/// How long a freshly spawned player is watched for an early failure.
pub const DEFAULT_STARTUP_GRACE: Duration = Duration::from_millis(300);

const EXIT_POLL: Duration = Duration::from_millis(10);

/// Plays audio through an external command such as `ffplay`.
///
/// The player decodes the file itself, so a file it cannot play only shows
/// up as the process exiting with a failure status. `start` watches the
/// child for a short grace period and reports such an exit as an error.
#[derive(Debug, Clone)]
pub struct ExternalPlayer {
    command: String,
    startup_grace: Duration,
}

impl ExternalPlayer {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), startup_grace: DEFAULT_STARTUP_GRACE }
    }

    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }
}

impl AudioOutput for ExternalPlayer {
    fn start(&self, path: &Path) -> Result<AudioHandle> {
        let audio_error = |reason: String| PlayError::Audio { path: path.to_path_buf(), reason };

        File::open(path).map_err(|e| audio_error(e.to_string()))?;

        let mut child = ProcCommand::new(&self.command)
            .arg("-nodisp")
            .arg("-autoexit")
            .arg("-loglevel")
            .arg("error")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| audio_error(format!("running {}: {}", self.command, e)))?;

        let deadline = Instant::now() + self.startup_grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) if !status.success() => {
                    return Err(audio_error(format!("{} exited with {}", self.command, status)));
                }
                // A clip shorter than the grace period may already be done.
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() >= deadline => break,
                Ok(None) => thread::sleep(EXIT_POLL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(audio_error(format!("watching {}: {}", self.command, e)));
                }
            }
        }

        info!("audio started with {} (pid {})", self.command, child.id());
        Ok(AudioHandle { child: Some(child) })
    }
}

/// Audio output that plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioOutput for Silent {
    fn start(&self, path: &Path) -> Result<AudioHandle> {
        debug!("silent playback, ignoring {}", path.display());
        Ok(AudioHandle::detached())
    }
}
