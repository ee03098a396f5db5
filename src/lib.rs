//! # termreel - terminal block-character video player
//!
//! `termreel` plays a directory of numbered still images as a block-character
//! animation in the terminal while an audio track plays alongside.
//!
//! ## Features
//!
//! - Numeric frame ordering (`2.jpg` before `10.jpg`, padded or not)
//! - Aspect-preserving nearest-neighbour fitting to the terminal
//! - Five-level luminance quantization with a configurable glyph table
//! - Bounded lookahead between the decoding thread and the renderer
//! - Diff rendering that only rewrites cells whose brightness changed
//!
//! ## Example
//!
//! ```no_run
//! use termreel::{PlaybackOptions, Player};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let player = Player::new();
//! let options = PlaybackOptions::default().with_bufsize(200);
//! let summary = player.play(Path::new("frames"), Path::new("audio.ogg"), &options)?;
//! println!("{} frames at {:.1} fps", summary.frames, summary.effective_fps());
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod clock;
pub mod error;
pub mod frames;
pub mod loader;
pub mod playback;
pub mod producer;
pub mod quantize;
pub mod queue;
pub mod renderer;
pub mod terminal;

use std::fs;
use std::io::{self, BufWriter};
use std::path::Path;
use std::time::Duration;

use log::info;
use serde::Deserialize;

pub use audio::{AudioOutput, ExternalPlayer, Silent};
pub use error::{PlayError, Result};
pub use loader::GridSize;
pub use playback::{PlaybackSummary, Session};
pub use quantize::GlyphTable;
pub use renderer::RenderMode;

fn default_glyphs() -> Vec<String> {
    quantize::default_glyphs()
}

fn default_fps() -> u32 {
    30
}

fn default_bufsize() -> usize {
    500
}

fn default_extension() -> String {
    "jpg".to_string()
}

fn default_stall_timeout_secs() -> u64 {
    30
}

fn default_audio_command() -> String {
    "ffplay".to_string()
}

/// Player configuration, usually read from `termreel.json`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Five glyphs from darkest to brightest, two characters each
    #[serde(default = "default_glyphs")]
    pub glyphs: Vec<String>,
    /// Display clock rate
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Default lookahead limit
    #[serde(default = "default_bufsize")]
    pub bufsize: usize,
    /// Extension of frame files
    #[serde(default = "default_extension")]
    pub frame_extension: String,
    #[serde(default)]
    pub render_mode: RenderMode,
    /// Seconds to wait on an empty queue before giving up; 0 waits forever
    #[serde(default = "default_stall_timeout_secs")]
    pub stall_timeout_secs: u64,
    /// External audio player binary
    #[serde(default = "default_audio_command")]
    pub audio_command: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            glyphs: default_glyphs(),
            fps: default_fps(),
            bufsize: default_bufsize(),
            frame_extension: default_extension(),
            render_mode: RenderMode::default(),
            stall_timeout_secs: default_stall_timeout_secs(),
            audio_command: default_audio_command(),
        }
    }
}

impl PlayerConfig {
    /// Checks everything that can be checked before touching the terminal.
    pub fn validate(&self) -> Result<()> {
        GlyphTable::new(&self.glyphs)?;
        if self.fps == 0 {
            return Err(PlayError::Config("fps must be greater than zero".into()));
        }
        if self.bufsize == 0 {
            return Err(PlayError::Config("bufsize must be at least 1".into()));
        }
        if self.frame_extension.trim_start_matches('.').is_empty() {
            return Err(PlayError::Config("frame_extension cannot be empty".into()));
        }
        Ok(())
    }
}

/// Options for one playback run
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackOptions {
    /// Pause between starting audio and the first frame
    pub delay: Duration,
    /// How many frames the producer may run ahead of the screen
    pub bufsize: usize,
    pub fps: u32,
    pub render_mode: RenderMode,
    /// `None` waits forever for the next frame
    pub stall_timeout: Option<Duration>,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self::from_config(&PlayerConfig::default())
    }
}

impl PlaybackOptions {
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self {
            delay: Duration::ZERO,
            bufsize: config.bufsize,
            fps: config.fps,
            render_mode: config.render_mode,
            stall_timeout: match config.stall_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_bufsize(mut self, bufsize: usize) -> Self {
        self.bufsize = bufsize;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    pub fn with_stall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Rejects options that could never play a frame.
    pub fn validate(&self) -> Result<()> {
        if self.bufsize == 0 {
            return Err(PlayError::Config("bufsize must be at least 1".into()));
        }
        if self.fps == 0 {
            return Err(PlayError::Config("fps must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Entry point for terminal playback
pub struct Player {
    config: PlayerConfig,
}

impl Player {
    /// Create a player with the built-in configuration
    pub fn new() -> Self {
        Self { config: PlayerConfig::default() }
    }

    /// Create a player with a custom configuration
    pub fn with_config(config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load configuration from a JSON file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| PlayError::Config(format!("reading config {}: {}", path.display(), e)))?;
        let config: PlayerConfig = serde_json::from_str(&text)
            .map_err(|e| PlayError::Config(format!("parsing config {}: {}", path.display(), e)))?;
        Self::with_config(config)
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Default playback options for this player's configuration
    pub fn options(&self) -> PlaybackOptions {
        PlaybackOptions::from_config(&self.config)
    }

    /// Play the frames in `frames_dir` on the controlling terminal while
    /// `audio_path` plays through the configured audio command.
    pub fn play(&self, frames_dir: &Path, audio_path: &Path, options: &PlaybackOptions) -> Result<PlaybackSummary> {
        options.validate()?;
        let (cols, rows) = terminal::terminal_size()?;
        let grid = terminal::grid_for_terminal(cols, rows)?;
        info!("terminal {}x{}, drawing on a {}x{} grid", cols, rows, grid.width, grid.height);

        let extension = self.config.frame_extension.trim_start_matches('.');
        let files = frames::find_frame_files(frames_dir, extension)?;
        info!("{} frames in {}", files.len(), frames_dir.display());

        let glyphs = GlyphTable::new(&self.config.glyphs)?;
        let audio = ExternalPlayer::new(self.config.audio_command.clone());
        let session = Session::new(grid, files, glyphs, options.clone());

        let _screen = terminal::ScreenGuard::enter(io::stdout(), grid.height as u16)?;
        session.run(BufWriter::new(io::stdout()), &audio, audio_path)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: PlayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, PlayerConfig::default());
        assert_eq!(cfg.bufsize, 500);
        assert_eq!(cfg.fps, 30);
        assert_eq!(cfg.render_mode, RenderMode::Diff);
    }

    #[test]
    fn config_fields_override_defaults() {
        let cfg: PlayerConfig =
            serde_json::from_str(r#"{"render_mode": "full", "stall_timeout_secs": 0, "frame_extension": "png"}"#).unwrap();
        let opts = PlaybackOptions::from_config(&cfg);
        assert_eq!(opts.render_mode, RenderMode::Full);
        assert_eq!(opts.stall_timeout, None);
        assert_eq!(cfg.frame_extension, "png");
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let short = PlayerConfig { glyphs: vec!["##".into()], ..PlayerConfig::default() };
        assert!(Player::with_config(short).is_err());

        let still = PlayerConfig { fps: 0, ..PlayerConfig::default() };
        assert!(Player::with_config(still).is_err());

        let unbuffered = PlayerConfig { bufsize: 0, ..PlayerConfig::default() };
        assert!(Player::with_config(unbuffered).is_err());
    }

    #[test]
    fn bad_options_fail_before_the_terminal_is_touched() {
        let dir = tempfile::tempdir().unwrap();
        let player = Player::new();

        // Neither the frames nor a terminal exist, so only option checks can produce these errors.
        let unbuffered = player.options().with_bufsize(0);
        let err = player.play(&dir.path().join("frames"), &dir.path().join("a.ogg"), &unbuffered).unwrap_err();
        assert!(matches!(err, PlayError::Config(ref m) if m.contains("bufsize")));

        let still = player.options().with_fps(0);
        let err = player.play(&dir.path().join("frames"), &dir.path().join("a.ogg"), &still).unwrap_err();
        assert!(matches!(err, PlayError::Config(ref m) if m.contains("fps")));
    }

    #[test]
    fn config_file_is_loaded_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        fs::write(&good, r#"{"fps": 24, "glyphs": ["  ", "..", "::", "++", "@@"]}"#).unwrap();
        let player = Player::from_config_file(&good).unwrap();
        assert_eq!(player.config().fps, 24);
        assert_eq!(player.options().fps, 24);

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(Player::from_config_file(&bad), Err(PlayError::Config(_))));
    }
}
