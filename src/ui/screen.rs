//! Double-buffered screen backend
//!
//! Writes land in a back buffer; `redraw` pushes it to the terminal, either
//! completely or as a delta against what the previous redraw left on the
//! device.
//!
//! The back buffer follows the terminal size lazily: a resize is noticed by
//! the next operation that touches the buffer, which resizes it (content
//! outside the new bounds is dropped, new cells are blank) and makes the
//! next `Auto` redraw a complete one.

use tracing::debug;

use super::input::Input;
use super::output::{check_text, DrawOptions, Lifecycle, Output, Pen};
use super::resize::ResizeHandle;
use super::terminal::Terminal;
use crate::config::Config;
use crate::core::style::check_drawable;
use crate::core::{Color, Grid, Keystroke, Position, Size, StyledCell, Styles};
use crate::device::MemoryMonitor;
use crate::error::Result;

/// How `redraw` reaches the device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RedrawMode {
    /// Complete after start or resize, delta otherwise
    #[default]
    Auto,
    /// Only cells that changed since the last redraw
    Delta,
    /// Every cell
    Complete,
}

/// What the last redraw did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedrawStats {
    /// Mode actually used (never `Auto`)
    pub mode: RedrawMode,
    pub cells_written: usize,
    pub cells_skipped: usize,
}

/// Screen backend
pub struct Screen {
    terminal: Terminal,
    back: Grid,
    /// Buffer as of the last redraw; `None` when the device content is not
    /// known to match anything
    front: Option<Grid>,
    cursor: Position,
    pen: Pen,
    last_redraw: Option<RedrawStats>,
}

impl Screen {
    pub fn open(config: Config) -> Result<Self> {
        Terminal::open(config).map(Self::new)
    }

    /// Screen on an in-memory terminal
    pub fn headless(config: Config) -> Result<(Self, MemoryMonitor)> {
        let (terminal, monitor) = Terminal::headless(config)?;
        Ok((Self::new(terminal), monitor))
    }

    pub fn new(terminal: Terminal) -> Self {
        let back = Grid::new(terminal.size());
        Self {
            terminal,
            back,
            front: None,
            cursor: Position::default(),
            pen: Pen::default(),
            last_redraw: None,
        }
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// Buffered cell at `pos`, `None` outside the screen
    pub fn cell(&self, pos: Position) -> Option<StyledCell> {
        if !self.size().contains(pos) {
            return None;
        }
        Some(self.back.get(pos).copied().unwrap_or(StyledCell::BLANK))
    }

    pub fn last_redraw(&self) -> Option<RedrawStats> {
        self.last_redraw
    }

    /// Follow the terminal size
    fn sync_size(&mut self) {
        let size = self.terminal.size();
        if size != self.back.size() {
            debug!("Back buffer resized {} -> {}", self.back.size(), size);
            self.back.resize(size);
            self.front = None;
        }
    }

    fn put_cells(&mut self, s: &str, pos: Position, opts: &DrawOptions) -> Position {
        let (fg, bg, styles) = self.pen.resolve(opts);
        let mut pos = pos;
        for ch in s.chars() {
            self.back.set(pos, StyledCell { ch, fg, bg, styles });
            pos = pos.right(1);
        }
        pos
    }

    /// Push the back buffer to the device
    pub fn redraw(&mut self, mode: RedrawMode) -> Result<&mut Self> {
        self.terminal.lifecycle().ensure_started()?;
        self.sync_size();

        // Without a record of the device there is nothing to diff against
        let mode = match (mode, &self.front) {
            (RedrawMode::Complete, _) | (_, None) => RedrawMode::Complete,
            (RedrawMode::Auto, Some(_)) | (RedrawMode::Delta, Some(_)) => RedrawMode::Delta,
        };

        self.terminal.begin_frame()?;
        let mut written = 0;
        match &self.front {
            Some(front) if mode == RedrawMode::Delta => {
                for (pos, cell) in self.back.diff(front) {
                    if self.terminal.emit(pos, cell)? {
                        written += 1;
                    }
                }
            }
            _ => {
                for (pos, cell) in self.back.cells() {
                    if self.terminal.emit(pos, cell)? {
                        written += 1;
                    }
                }
            }
        }
        self.terminal.place_cursor(self.cursor)?;
        self.terminal.end_frame()?;
        self.terminal.flush()?;

        self.front = Some(self.back.clone());
        let stats = RedrawStats {
            mode,
            cells_written: written,
            cells_skipped: self.back.size().area() - written,
        };
        debug!(
            "Redraw {:?}: {} written, {} skipped",
            stats.mode, stats.cells_written, stats.cells_skipped
        );
        self.last_redraw = Some(stats);
        Ok(self)
    }
}

impl Output for Screen {
    /// `opts.flush` has no effect; only `redraw` reaches the device
    fn write_char(&mut self, ch: char, pos: Option<Position>, opts: &DrawOptions) -> Result<&mut Self> {
        self.terminal.lifecycle().ensure_started()?;
        check_drawable(ch)?;
        self.sync_size();
        let mut buf = [0u8; 4];
        let pos = pos.unwrap_or(self.cursor);
        self.cursor = self.put_cells(ch.encode_utf8(&mut buf), pos, opts);
        Ok(self)
    }

    fn write_str(&mut self, s: &str, pos: Option<Position>, opts: &DrawOptions) -> Result<&mut Self> {
        self.terminal.lifecycle().ensure_started()?;
        check_text(s)?;
        self.sync_size();
        let pos = pos.unwrap_or(self.cursor);
        self.cursor = self.put_cells(s, pos, opts);
        Ok(self)
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, pos: Position) -> Result<&mut Self> {
        self.terminal.lifecycle().ensure_started()?;
        self.cursor = pos;
        Ok(self)
    }

    /// Flush the device; the back buffer stays unsent until `redraw`
    fn flush(&mut self) -> Result<&mut Self> {
        self.terminal.flush()?;
        Ok(self)
    }

    fn clear(&mut self) -> Result<&mut Self> {
        self.terminal.lifecycle().ensure_started()?;
        self.sync_size();
        self.back.clear();
        self.cursor = Position::default();
        Ok(self)
    }

    fn start(&mut self) -> Result<&mut Self> {
        if self.terminal.lifecycle() == Lifecycle::Started {
            return Ok(self);
        }
        self.terminal.start()?;
        self.sync_size();
        self.front = None;
        Ok(self)
    }

    fn stop(&mut self) -> Result<&mut Self> {
        self.terminal.stop()?;
        self.front = None;
        Ok(self)
    }

    fn lifecycle(&self) -> Lifecycle {
        self.terminal.lifecycle()
    }

    fn size(&self) -> Size {
        self.terminal.size()
    }

    fn fg(&self) -> Color {
        self.pen.fg
    }

    fn set_fg(&mut self, color: Color) -> &mut Self {
        self.pen.fg = color;
        self
    }

    fn bg(&self) -> Color {
        self.pen.bg
    }

    fn set_bg(&mut self, color: Color) -> &mut Self {
        self.pen.bg = color;
        self
    }

    fn styles(&self) -> Styles {
        self.pen.styles
    }

    fn set_styles(&mut self, styles: Styles) -> &mut Self {
        self.pen.styles = styles;
        self
    }

    fn subscribe_resize<F>(&mut self, callback: F) -> ResizeHandle
    where
        F: Fn(u16, u16) + Send + Sync + 'static,
    {
        self.terminal.subscribe_resize(callback)
    }

    fn unsubscribe_resize(&mut self, handle: ResizeHandle) -> bool {
        self.terminal.unsubscribe_resize(handle)
    }
}

impl Input for Screen {
    fn poll(&mut self) -> Result<Option<Keystroke>> {
        self.terminal.poll()
    }

    fn get(&mut self) -> Result<Keystroke> {
        self.terminal.get()
    }
}
