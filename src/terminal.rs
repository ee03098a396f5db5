use std::io::Write;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};

use crate::error::{PlayError, Result};
use crate::loader::GridSize;
use crate::quantize::GLYPH_COLUMNS;

/// Columns and rows of the controlling terminal.
pub fn terminal_size() -> Result<(u16, u16)> {
    terminal::size().map_err(PlayError::Terminal)
}

/// Drawable grid for a terminal of `cols` x `rows`: each logical pixel is two
/// columns wide and the bottom row is kept for the status line.
pub fn grid_for_terminal(cols: u16, rows: u16) -> Result<GridSize> {
    let width = cols as usize / GLYPH_COLUMNS;
    let height = rows.saturating_sub(1);
    if width == 0 || height == 0 {
        return Err(PlayError::Config(format!(
            "terminal of {}x{} is too small to draw frames",
            cols, rows
        )));
    }
    Ok(GridSize::new(width as u32, height as u32))
}

/// Hides the cursor and clears the screen for the lifetime of the guard.
/// On drop the cursor is shown again just below the status line.
pub struct ScreenGuard<W: Write> {
    out: W,
    status_row: u16,
}

impl<W: Write> ScreenGuard<W> {
    pub fn enter(mut out: W, status_row: u16) -> Result<Self> {
        execute!(out, Hide, Clear(ClearType::All), MoveTo(0, 0)).map_err(PlayError::Terminal)?;
        Ok(Self { out, status_row })
    }
}

impl<W: Write> Drop for ScreenGuard<W> {
    fn drop(&mut self) {
        let _ = execute!(self.out, MoveTo(0, self.status_row), Print("\r\n"), Show);
    }
}
