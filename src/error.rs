use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

/// Errors that abort a playback session.
///
/// Every variant is fatal for the current session; nothing in the pipeline
/// retries. The message names the stage that failed so the operator can tell
/// a bad frame directory apart from a broken terminal or a corrupt image.
#[derive(thiserror::Error, Debug)]
pub enum PlayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("terminal setup failed: {0}")]
    Terminal(#[source] io::Error),

    #[error("enumerating frames in {}: {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("enumerating frames: file name {name:?} does not start with a frame number")]
    FrameName {
        name: String,
        #[source]
        source: ParseIntError,
    },

    #[error("decoding frame {index} ({}): {source}", path.display())]
    Decode {
        index: usize,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("starting audio playback for {}: {reason}", path.display())]
    Audio { path: PathBuf, reason: String },

    #[error("writing frame to terminal: {0}")]
    Output(#[source] io::Error),

    #[error("starting frame producer: {0}")]
    Spawn(#[source] io::Error),

    #[error("frame producer stalled: no frame arrived within {0:?}")]
    Stalled(Duration),

    #[error("frame producer stopped without reporting a result")]
    ProducerPanicked,
}

impl PlayError {
    /// Short label of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            PlayError::Config(_) => "configuration",
            PlayError::Terminal(_) => "terminal setup",
            PlayError::Enumeration { .. } | PlayError::FrameName { .. } => "enumeration",
            PlayError::Decode { .. }
            | PlayError::Spawn(_)
            | PlayError::Stalled(_)
            | PlayError::ProducerPanicked => "decode",
            PlayError::Audio { .. } => "audio",
            PlayError::Output(_) => "render",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayError>;
