//! Terminal devices.
//!
//! A [`Device`] is the boundary to whatever actually shows characters and
//! delivers keystrokes:
//!
//! - **console**: the process's own terminal, driven through crossterm
//! - **memory**: a headless in-memory terminal model
//!
//! Devices are immediate-mode: they put characters where their cursor is and
//! know nothing about back buffers. `Terminal` sits directly on a device;
//! `Screen` sits on a `Terminal`.

pub mod console;
pub mod memory;

use std::io;
use std::time::Duration;

use crossterm::event::{KeyEvent, MouseEvent};

use crate::core::{Color, Position, Size, Styles};
use crate::ui::resize::ResizeHub;

pub use console::ConsoleDevice;
pub use memory::{MemoryDevice, MemoryMonitor};

/// An input event as decoded by the device
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Reply to a cursor location query
    ///
    /// Only the memory device reports these; crossterm consumes the console's
    /// replies itself.
    CursorReport(Position),
    Resize(Size),
    /// The input stream ended; nothing more will arrive
    EndOfInput,
}

/// Raw terminal operations
///
/// Implementations must be `Send` so a `Terminal` can move between threads;
/// they are never shared between threads without external locking.
pub trait Device: Send {
    /// Current size of the device
    fn size(&self) -> io::Result<Size>;

    /// Enter the alternate screen, saving whatever was shown before
    fn enter(&mut self, title: &str) -> io::Result<()>;

    /// Leave the alternate screen and restore the previous content
    ///
    /// Calling it when not entered does nothing.
    fn leave(&mut self) -> io::Result<()>;

    fn move_to(&mut self, pos: Position) -> io::Result<()>;

    /// Set colors and styles for subsequent characters
    fn set_attrs(&mut self, fg: Color, bg: Color, styles: Styles) -> io::Result<()>;

    /// Print a character at the device cursor and advance it by its width
    fn put_char(&mut self, ch: char) -> io::Result<()>;

    /// Blank the whole display with default attributes
    fn clear(&mut self) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// Start a batch of writes that should appear at once
    fn begin_frame(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Wait up to `timeout` (forever for `None`) for an input event
    ///
    /// `Ok(None)` means nothing arrived, or the event was one the device
    /// does not report.
    fn read_event(&mut self, timeout: Option<Duration>) -> io::Result<Option<DeviceEvent>>;

    /// Report resizes to `hub` from outside the input stream
    fn watch_resize(&mut self, _hub: ResizeHub) -> io::Result<()> {
        Ok(())
    }

    /// Whether the named font can be used
    fn font_available(&self, _name: &str) -> bool {
        true
    }
}
