//! Fixed-tick renderer.
//!
//! The renderer is the only writer of the on-screen state. Each tick it takes
//! the next quantized frame from the queue, turns it into terminal output
//! (only the changed cells in [`RenderMode::Diff`], everything in
//! [`RenderMode::Full`]) and refreshes the status line below the picture.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use log::{debug, trace};
use serde::Deserialize;

use crate::clock::DisplayClock;
use crate::error::{PlayError, Result};
use crate::loader::GridSize;
use crate::quantize::{BucketGrid, GlyphTable, GLYPH_COLUMNS};
use crate::queue::{FrameQueue, TakeError};

/// How each frame reaches the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Rewrite only the cells whose bucket changed since the last frame.
    #[default]
    Diff,
    /// Clear the screen and rewrite every cell.
    Full,
}

/// Marks a cell that has not been drawn since the screen was cleared.
const UNDRAWN: u8 = u8::MAX;

/// What is currently on screen, one bucket per logical pixel.
#[derive(Debug, Clone)]
pub struct ScreenState {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl ScreenState {
    pub fn new(size: GridSize) -> Self {
        let (width, height) = (size.width as usize, size.height as usize);
        Self { width, height, cells: vec![UNDRAWN; width * height] }
    }

    /// Bucket shown at `(x, y)`, or `None` if that cell was never drawn.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        match self.cells[y * self.width + x] {
            UNDRAWN => None,
            b => Some(b),
        }
    }

    fn reset(&mut self) {
        self.cells.fill(UNDRAWN);
    }
}

/// Appends terminal output for the cells of `frame` that differ from
/// `screen`, updating `screen` to match. Runs of adjacent changed cells
/// share a single cursor move. Returns the number of cells written.
pub fn encode_diff(screen: &mut ScreenState, frame: &BucketGrid, glyphs: &GlyphTable, out: &mut Vec<u8>) -> io::Result<usize> {
    let width = frame.width().min(screen.width);
    let height = frame.height().min(screen.height);
    let mut cursor = None;
    let mut written = 0;

    for y in 0..height {
        for x in 0..width {
            let bucket = frame.get(x, y);
            let slot = &mut screen.cells[y * screen.width + x];
            if *slot == bucket {
                continue;
            }
            *slot = bucket;
            if cursor != Some((x, y)) {
                queue!(out, MoveTo((x * GLYPH_COLUMNS) as u16, y as u16))?;
            }
            queue!(out, Print(glyphs.glyph(bucket)))?;
            cursor = Some((x + 1, y));
            written += 1;
        }
    }
    Ok(written)
}

/// Appends output that clears the screen and draws all of `frame`.
pub fn encode_full(screen: &mut ScreenState, frame: &BucketGrid, glyphs: &GlyphTable, out: &mut Vec<u8>) -> io::Result<usize> {
    let width = frame.width().min(screen.width);
    let height = frame.height().min(screen.height);
    screen.reset();
    queue!(out, Clear(ClearType::All))?;

    let mut line = String::with_capacity(width * GLYPH_COLUMNS * 3);
    for y in 0..height {
        line.clear();
        for (x, &bucket) in frame.row(y)[..width].iter().enumerate() {
            line.push_str(glyphs.glyph(bucket));
            screen.cells[y * screen.width + x] = bucket;
        }
        queue!(out, MoveTo(0, y as u16), Print(&line))?;
    }
    Ok(width * height)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Running,
    Done,
}

pub struct Renderer<W: Write> {
    out: W,
    glyphs: GlyphTable,
    mode: RenderMode,
    screen: ScreenState,
    status_row: u16,
    total: usize,
    drawn: usize,
    starved: usize,
    buf: Vec<u8>,
}

impl<W: Write> Renderer<W> {
    /// A renderer for `total` frames on a grid of `size`; the status line goes
    /// on the row just below the grid.
    pub fn new(out: W, glyphs: GlyphTable, mode: RenderMode, size: GridSize, total: usize) -> Self {
        Self {
            out,
            glyphs,
            mode,
            screen: ScreenState::new(size),
            status_row: size.height as u16,
            total,
            drawn: 0,
            starved: 0,
            buf: Vec::new(),
        }
    }

    pub fn state(&self) -> RenderState {
        if self.drawn >= self.total {
            RenderState::Done
        } else {
            RenderState::Running
        }
    }

    pub fn drawn(&self) -> usize {
        self.drawn
    }

    /// Ticks on which the queue was empty when the renderer came for a frame.
    pub fn starved(&self) -> usize {
        self.starved
    }

    pub fn screen(&self) -> &ScreenState {
        &self.screen
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Draws one frame plus the status line and flushes the output.
    /// `buffered` is the number of frames still waiting in the queue.
    pub fn draw(&mut self, frame: &BucketGrid, buffered: usize) -> Result<()> {
        self.buf.clear();
        let cells = match self.mode {
            RenderMode::Diff => encode_diff(&mut self.screen, frame, &self.glyphs, &mut self.buf),
            RenderMode::Full => encode_full(&mut self.screen, frame, &self.glyphs, &mut self.buf),
        }
        .map_err(PlayError::Output)?;
        self.drawn += 1;

        let buffered_kib = buffered * frame.byte_len() / 1024;
        queue!(
            self.buf,
            MoveTo(0, self.status_row),
            Clear(ClearType::CurrentLine),
            Print(format!(
                "Frame: {}/{} | Buffer: {} frames ({} KiB) | Starved: {}",
                self.drawn, self.total, buffered, buffered_kib, self.starved
            ))
        )
        .map_err(PlayError::Output)?;

        self.out.write_all(&self.buf).map_err(PlayError::Output)?;
        self.out.flush().map_err(PlayError::Output)?;
        trace!("drew frame {} ({} cells, {} bytes)", self.drawn, cells, self.buf.len());
        Ok(())
    }

    /// Takes the next frame from `queue` and draws it. Does nothing once
    /// every frame has been drawn.
    pub fn tick(&mut self, queue: &FrameQueue<BucketGrid>, stall_timeout: Option<Duration>) -> Result<RenderState> {
        if self.state() == RenderState::Done {
            return Ok(RenderState::Done);
        }
        if queue.depth() == 0 {
            self.starved += 1;
            debug!("renderer waiting on frame {}", self.drawn);
        }
        let frame = queue.take(stall_timeout).map_err(|e| match e {
            TakeError::TimedOut => PlayError::Stalled(stall_timeout.unwrap_or_default()),
            TakeError::Closed => PlayError::ProducerPanicked,
        })?;
        self.draw(&frame, queue.depth())?;
        Ok(self.state())
    }

    /// Draws frames on every clock tick until all of them are on screen.
    pub fn run(&mut self, queue: &FrameQueue<BucketGrid>, clock: &mut DisplayClock, stall_timeout: Option<Duration>) -> Result<()> {
        while self.state() == RenderState::Running {
            clock.wait();
            self.tick(queue, stall_timeout)?;
        }
        Ok(())
    }
}
