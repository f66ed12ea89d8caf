//! Output backends, input and resize notification.
//!
//! - **output**: the `Output` capability shared by both backends
//! - **terminal**: immediate-mode backend, writes go straight to the device
//! - **screen**: buffered backend with delta/complete redraw
//! - **input**: keystroke normalization and the `Input` capability
//! - **resize**: resize subscriptions
//! - **sheet**: ragged grids of drawable items
//! - **session**: scoped start/stop

pub mod input;
pub mod output;
pub mod resize;
pub mod screen;
pub mod session;
pub mod sheet;
pub mod terminal;

pub use input::Input;
pub use output::{DrawOptions, Lifecycle, Output};
pub use resize::{ResizeCallback, ResizeHandle, ResizeHub, ResizeListener};
pub use screen::{RedrawMode, RedrawStats, Screen};
pub use session::{with_session, SessionGuard};
pub use sheet::{Sheet, SheetItem, Text};
pub use terminal::Terminal;
