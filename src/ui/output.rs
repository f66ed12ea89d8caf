//! Output capability
//!
//! [`Output`] is the drawing interface shared by the immediate-mode
//! [`Terminal`](super::Terminal) and the buffered [`Screen`](super::Screen).
//!
//! Conventions both backends hold to:
//! - Writes outside the current size are clipped silently; the cursor still
//!   advances past them.
//! - Every write validates all of its input before changing anything.
//! - Drawing, cursor and input calls require the `Started` state.
//!
//! Instances have a single owner. Nothing here locks internally, so callers
//! sharing one across threads must serialize access themselves.

use crate::core::style::check_drawable;
use crate::core::{Color, Position, Size, Styles};
use crate::error::{Error, Result};

use super::resize::ResizeHandle;
use super::sheet::Sheet;

/// Session state of a backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Started,
    Stopped,
}

impl Lifecycle {
    pub(crate) fn ensure_started(self) -> Result<()> {
        match self {
            Lifecycle::Started => Ok(()),
            _ => Err(Error::InactiveOutput),
        }
    }
}

/// Per-call drawing options
///
/// `None` colors and styles inherit the backend's ambient pen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawOptions {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub styles: Option<Styles>,
    /// Terminal: push the write to the device right away. Screen: ignored.
    pub flush: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            fg: None,
            bg: None,
            styles: None,
            flush: true,
        }
    }
}

impl DrawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn styles(mut self, styles: impl Into<Styles>) -> Self {
        self.styles = Some(styles.into());
        self
    }

    pub fn flush(mut self, flush: bool) -> Self {
        self.flush = flush;
        self
    }

    /// Build options from keyword names
    ///
    /// Every name is checked before anything is returned.
    pub fn from_names<S: AsRef<str>>(fg: Option<&str>, bg: Option<&str>, styles: &[S]) -> Result<Self> {
        Ok(Self {
            fg: fg.map(str::parse::<Color>).transpose()?,
            bg: bg.map(str::parse::<Color>).transpose()?,
            styles: if styles.is_empty() {
                None
            } else {
                Some(Styles::parse_names(styles)?)
            },
            flush: true,
        })
    }
}

/// Ambient colors and styles applied when options leave them unset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pen {
    pub fg: Color,
    pub bg: Color,
    pub styles: Styles,
}

impl Pen {
    pub fn resolve(&self, opts: &DrawOptions) -> (Color, Color, Styles) {
        (
            opts.fg.unwrap_or(self.fg),
            opts.bg.unwrap_or(self.bg),
            opts.styles.unwrap_or(self.styles),
        )
    }
}

/// Check every character of `s` can be drawn
pub(crate) fn check_text(s: &str) -> Result<()> {
    s.chars().try_for_each(check_drawable)
}

/// Drawing interface shared by all backends
pub trait Output {
    /// Write one character at `pos` (or the cursor), then move the cursor one
    /// column right
    fn write_char(&mut self, ch: char, pos: Option<Position>, opts: &DrawOptions) -> Result<&mut Self>;

    /// Write each character of `s` left to right with the same options
    ///
    /// The cursor ends one column past the last character.
    fn write_str(&mut self, s: &str, pos: Option<Position>, opts: &DrawOptions) -> Result<&mut Self>;

    fn cursor(&self) -> Position;

    fn set_cursor(&mut self, pos: Position) -> Result<&mut Self>;

    /// Push pending device output
    fn flush(&mut self) -> Result<&mut Self>;

    /// Blank every cell with default styling and home the cursor
    fn clear(&mut self) -> Result<&mut Self>;

    /// Enter the display session; a no-op when already started
    fn start(&mut self) -> Result<&mut Self>;

    /// Leave the display session; a no-op when not started
    fn stop(&mut self) -> Result<&mut Self>;

    fn lifecycle(&self) -> Lifecycle;

    fn size(&self) -> Size;

    fn fg(&self) -> Color;
    fn set_fg(&mut self, color: Color) -> &mut Self;
    fn bg(&self) -> Color;
    fn set_bg(&mut self, color: Color) -> &mut Self;
    fn styles(&self) -> Styles;
    fn set_styles(&mut self, styles: Styles) -> &mut Self;

    /// Call `callback(columns, rows)` on every confirmed resize
    fn subscribe_resize<F>(&mut self, callback: F) -> ResizeHandle
    where
        F: Fn(u16, u16) + Send + Sync + 'static,
        Self: Sized;

    fn unsubscribe_resize(&mut self, handle: ResizeHandle) -> bool;

    /// Draw a sheet with its first row starting at `origin`
    ///
    /// Row `i` starts at `(origin.col, origin.row + i)`; items follow each
    /// other left to right and rows are not padded. The whole sheet is
    /// validated before the first cell is written.
    fn put_sheet(&mut self, origin: Position, sheet: &Sheet) -> Result<&mut Self>
    where
        Self: Sized,
    {
        sheet.validate()?;
        for (i, row) in sheet.rows().iter().enumerate() {
            let mut pos = origin.down(i as u16);
            for item in row {
                let opts = item.options().flush(false);
                let text = item.text();
                self.write_str(&text, Some(pos), &opts)?;
                pos = pos.right(text.chars().count() as u16);
            }
        }
        self.flush()
    }
}
