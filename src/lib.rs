//! termscreen - terminal output and keyboard input behind one API
//!
//! Two output backends share the [`Output`] capability:
//!
//! - [`Terminal`]: immediate mode, every write goes to the device
//! - [`Screen`]: writes land in a back buffer and reach the device on
//!   [`Screen::redraw`], completely or as a delta
//!
//! Both read keystrokes through [`Input`] and report resizes to subscribers.
//!
//! # Quick Start
//!
//! ```no_run
//! use termscreen::{with_session, Color, Config, DrawOptions, Output, Position, RedrawMode, Screen};
//!
//! let mut screen = Screen::open(Config::load())?;
//! with_session(&mut screen, |s| {
//!     s.write_str("hi", Some(Position::new(0, 0)), &DrawOptions::new().fg(Color::Red))?;
//!     s.redraw(RedrawMode::Complete)?;
//!     Ok(())
//! })?;
//! # Ok::<(), termscreen::Error>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! Screen ──> Terminal ──> Device (console | memory)
//!   │            └── ResizeHub ──> subscribers
//!   └── back buffer (Grid)
//! ```

pub mod config;
pub mod core;
pub mod device;
pub mod error;
pub mod ui;

pub use crate::config::{BackendKind, Charset, Config, Palette};
pub use crate::core::{Color, Key, Keystroke, Modifiers, Position, Size, Style, StyledCell, Styles};
pub use crate::error::{Error, Result};
pub use ui::{
    with_session, DrawOptions, Input, Lifecycle, Output, RedrawMode, RedrawStats, ResizeHandle,
    Screen, SessionGuard, Sheet, SheetItem, Terminal,
};
