//! Core data model.
//!
//! - **style**: positions, sizes, the color and style registries, styled cells
//! - **keys**: normalized keystrokes and the key-name registry
//! - **grid**: rectangular grid of styled cells with diffing
//!
//! # Architecture
//!
//! ```text
//! Grid
//! └── Row
//!     └── StyledCell (char + fg + bg + Styles)
//! ```

pub mod grid;
pub mod keys;
pub mod style;

pub use grid::{Grid, Row};
pub use keys::{Key, Keystroke, Modifiers, MouseAction, MouseButton, MouseReport};
pub use style::{Color, Position, Size, Style, StyledCell, Styles};
