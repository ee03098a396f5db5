//! Playback driver.
//!
//! Startup order matters for audio/video alignment: the producer starts
//! first so frames are already buffering, then audio, then the optional
//! startup delay, and only then does the display clock begin ticking.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::audio::AudioOutput;
use crate::clock::DisplayClock;
use crate::error::{PlayError, Result};
use crate::loader::GridSize;
use crate::producer::{join_producer, spawn_producer};
use crate::quantize::GlyphTable;
use crate::queue::FrameQueue;
use crate::renderer::Renderer;
use crate::PlaybackOptions;

/// Outcome of a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSummary {
    pub frames: usize,
    pub elapsed: Duration,
    /// Ticks on which the renderer found the queue empty.
    pub starved_ticks: usize,
}

impl PlaybackSummary {
    pub fn effective_fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// One run over an ordered list of frame files.
pub struct Session {
    grid: GridSize,
    files: Vec<PathBuf>,
    glyphs: GlyphTable,
    options: PlaybackOptions,
}

impl Session {
    pub fn new(grid: GridSize, files: Vec<PathBuf>, glyphs: GlyphTable, options: PlaybackOptions) -> Self {
        Self { grid, files, glyphs, options }
    }

    pub fn frame_count(&self) -> usize {
        self.files.len()
    }

    /// Plays every frame to `out` while `audio` plays `audio_path`.
    ///
    /// A producer failure takes precedence over whatever the renderer saw,
    /// since a dead producer shows up on the render side only as a closed or
    /// stalled queue.
    pub fn run<W: Write, A: AudioOutput>(self, out: W, audio: &A, audio_path: &Path) -> Result<PlaybackSummary> {
        let Session { grid, files, glyphs, options } = self;
        let total = files.len();
        options.validate()?;
        let mut clock = DisplayClock::new(options.fps)?;

        let queue = Arc::new(FrameQueue::new(options.bufsize));
        let producer = spawn_producer(files, grid, Arc::clone(&queue))?;
        info!("producer started: {} frames, lookahead {}", total, queue.lookahead());

        let _audio = match audio.start(audio_path) {
            Ok(handle) => handle,
            Err(e) => {
                queue.close();
                if let Err(produced) = join_producer(producer) {
                    debug!("producer also failed before audio started: {}", produced);
                }
                return Err(e);
            }
        };

        if !options.delay.is_zero() {
            info!("waiting {:?} before the first frame", options.delay);
            thread::sleep(options.delay);
        }

        let started = Instant::now();
        let mut renderer = Renderer::new(out, glyphs, options.render_mode, grid, total);
        let rendered = renderer.run(&queue, &mut clock, options.stall_timeout);

        // Cancels the producer if rendering stopped early.
        queue.close();
        let produced = match &rendered {
            Err(PlayError::Stalled(_)) if !producer.is_finished() => {
                warn!("abandoning a producer stuck on a frame");
                Ok(0)
            }
            _ => join_producer(producer),
        };

        if let Err(e) = produced.and(rendered) {
            error!("{} stage failed: {}", e.stage(), e);
            return Err(e);
        }
        let summary = PlaybackSummary {
            frames: renderer.drawn(),
            elapsed: started.elapsed(),
            starved_ticks: renderer.starved(),
        };
        info!("playback finished: {} frames in {:?}", summary.frames, summary.elapsed);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Silent;

    #[test]
    fn zero_frames_finish_without_drawing() {
        let session = Session::new(GridSize::new(2, 2), Vec::new(), GlyphTable::default(), PlaybackOptions::default());
        let mut out = Vec::new();
        let summary = session.run(&mut out, &Silent, Path::new("none.ogg")).unwrap();
        assert_eq!(summary.frames, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_bufsize_is_rejected() {
        let options = PlaybackOptions::default().with_bufsize(0);
        let session = Session::new(GridSize::new(2, 2), Vec::new(), GlyphTable::default(), options);
        let err = session.run(Vec::new(), &Silent, Path::new("none.ogg")).unwrap_err();
        assert!(matches!(err, PlayError::Config(_)));
    }
}
