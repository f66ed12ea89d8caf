//! Colors, styles and the styled cell
//!
//! This module defines the fixed registries drawing calls accept and the
//! atomic unit stored in a screen's back buffer.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::error::{Error, Result};

/// Zero-based cell coordinate (column grows rightward, row grows downward)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub col: u16,
    pub row: u16,
}

impl Position {
    pub const fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }

    /// Position `n` columns to the right
    pub const fn right(self, n: u16) -> Self {
        Self {
            col: self.col.saturating_add(n),
            row: self.row,
        }
    }

    /// Position `n` rows below
    pub const fn down(self, n: u16) -> Self {
        Self {
            col: self.col,
            row: self.row.saturating_add(n),
        }
    }
}

impl From<(u16, u16)> for Position {
    fn from((col, row): (u16, u16)) -> Self {
        Self { col, row }
    }
}

/// Terminal dimensions in character cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Whether `pos` lies inside these bounds
    pub const fn contains(self, pos: Position) -> bool {
        pos.col < self.cols && pos.row < self.rows
    }

    pub const fn area(self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

impl From<(u16, u16)> for Size {
    fn from((cols, rows): (u16, u16)) -> Self {
        Self { cols, rows }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Symbolic color
///
/// `Default` leaves the choice to the device (the host terminal's own
/// foreground or background).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    #[default]
    Default,
    Black,
    White,
    Red,
    Green,
    Blue,
    Cyan,
    Magenta,
    Yellow,
}

impl Color {
    /// Every non-default color
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Black => "black",
            Color::White => "white",
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Cyan => "cyan",
            Color::Magenta => "magenta",
            Color::Yellow => "yellow",
        }
    }

    /// ANSI color number (0-7), `None` for the default sentinel
    pub fn ansi_index(self) -> Option<u8> {
        match self {
            Color::Default => None,
            Color::Black => Some(0),
            Color::Red => Some(1),
            Color::Green => Some(2),
            Color::Yellow => Some(3),
            Color::Blue => Some(4),
            Color::Magenta => Some(5),
            Color::Cyan => Some(6),
            Color::White => Some(7),
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "default" => Ok(Color::Default),
            "black" => Ok(Color::Black),
            "white" => Ok(Color::White),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            "cyan" => Ok(Color::Cyan),
            "magenta" => Ok(Color::Magenta),
            "yellow" => Ok(Color::Yellow),
            _ => Err(Error::invalid_attribute("color", s)),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.name().to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single text attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Style {
    Bold,
    Reverse,
    Blink,
    Underline,
    Circled,
    Strikethrough,
    Fraktur,
}

impl Style {
    pub const ALL: [Style; 7] = [
        Style::Bold,
        Style::Reverse,
        Style::Blink,
        Style::Underline,
        Style::Circled,
        Style::Strikethrough,
        Style::Fraktur,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Style::Bold => "bold",
            Style::Reverse => "reverse",
            Style::Blink => "blink",
            Style::Underline => "underline",
            Style::Circled => "circled",
            Style::Strikethrough => "strikethrough",
            Style::Fraktur => "fraktur",
        }
    }
}

impl FromStr for Style {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "bold" => Ok(Style::Bold),
            "reverse" => Ok(Style::Reverse),
            "blink" => Ok(Style::Blink),
            "underline" => Ok(Style::Underline),
            "circled" => Ok(Style::Circled),
            "strikethrough" => Ok(Style::Strikethrough),
            "fraktur" => Ok(Style::Fraktur),
            _ => Err(Error::invalid_attribute("style", s)),
        }
    }
}

impl TryFrom<String> for Style {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        style.name().to_string()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of active styles; members toggle independently
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Styles: u8 {
        const BOLD          = 0b0000_0001;
        const REVERSE       = 0b0000_0010;
        const BLINK         = 0b0000_0100;
        const UNDERLINE     = 0b0000_1000;
        const CIRCLED       = 0b0001_0000;
        const STRIKETHROUGH = 0b0010_0000;
        const FRAKTUR       = 0b0100_0000;
    }
}

impl From<Style> for Styles {
    fn from(style: Style) -> Self {
        match style {
            Style::Bold => Styles::BOLD,
            Style::Reverse => Styles::REVERSE,
            Style::Blink => Styles::BLINK,
            Style::Underline => Styles::UNDERLINE,
            Style::Circled => Styles::CIRCLED,
            Style::Strikethrough => Styles::STRIKETHROUGH,
            Style::Fraktur => Styles::FRAKTUR,
        }
    }
}

impl FromIterator<Style> for Styles {
    fn from_iter<I: IntoIterator<Item = Style>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Styles::empty(), |acc, style| acc | Styles::from(style))
    }
}

impl Styles {
    /// Members of the set in registry order
    pub fn members(self) -> impl Iterator<Item = Style> {
        Style::ALL
            .into_iter()
            .filter(move |style| self.contains(Styles::from(*style)))
    }

    /// Parse a list of style names; all names are checked before returning
    pub fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        names
            .iter()
            .map(|name| name.as_ref().parse::<Style>())
            .collect()
    }
}

/// One buffered character with its colors and styles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyledCell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
    pub styles: Styles,
}

impl Default for StyledCell {
    fn default() -> Self {
        Self::BLANK
    }
}

impl StyledCell {
    /// A space with default colors and no styles
    pub const BLANK: StyledCell = StyledCell {
        ch: ' ',
        fg: Color::Default,
        bg: Color::Default,
        styles: Styles::empty(),
    };

    /// Build a cell, rejecting control characters
    pub fn new(ch: char, fg: Color, bg: Color, styles: Styles) -> Result<Self> {
        check_drawable(ch)?;
        Ok(Self { ch, fg, bg, styles })
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::BLANK
    }
}

/// Fails for characters a cell cannot hold
///
/// A cell is exactly one column: controls (newline, tab, escape), zero-width
/// combining marks and double-width glyphs are all rejected.
pub fn check_drawable(ch: char) -> Result<()> {
    if ch.is_control() || ch.width() != Some(1) {
        return Err(Error::InvalidCharacter(ch));
    }
    Ok(())
}

/// Lowercase and fold `_` to `-` so "Strike_Through" style spellings match
pub(crate) fn normalize_name(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_names() {
        for color in Color::ALL {
            assert_eq!(color.name().parse::<Color>().unwrap(), color);
        }
        assert_eq!("RED".parse::<Color>().unwrap(), Color::Red);
        assert_eq!(" default ".parse::<Color>().unwrap(), Color::Default);

        let err = "purple".parse::<Color>().unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { kind: "color", .. }));
    }

    #[test]
    fn test_style_set_composes() {
        let styles: Styles = [Style::Bold, Style::Underline, Style::Bold].into_iter().collect();
        assert_eq!(styles, Styles::BOLD | Styles::UNDERLINE);
        assert_eq!(
            styles.members().collect::<Vec<_>>(),
            vec![Style::Bold, Style::Underline]
        );
    }

    #[test]
    fn test_parse_style_names_rejects_unknown() {
        assert_eq!(
            Styles::parse_names(&["bold", "fraktur"]).unwrap(),
            Styles::BOLD | Styles::FRAKTUR
        );
        let err = Styles::parse_names(&["bold", "italic"]).unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { kind: "style", .. }));
    }

    #[test]
    fn test_control_chars_rejected() {
        assert!(StyledCell::new('\n', Color::Red, Color::Default, Styles::empty()).is_err());
        assert!(check_drawable('\t').is_err());
        assert!(check_drawable('\u{1b}').is_err());
        assert!(check_drawable('a').is_ok());
        assert!(check_drawable('é').is_ok());
    }

    #[test]
    fn test_cells_are_one_column_wide() {
        assert!(matches!(check_drawable('日'), Err(Error::InvalidCharacter('日'))));
        assert!(matches!(
            check_drawable('\u{301}'),
            Err(Error::InvalidCharacter('\u{301}'))
        ));
        assert!(matches!(check_drawable('\u{200b}'), Err(Error::InvalidCharacter(_))));
        assert!(StyledCell::new('漢', Color::Red, Color::Default, Styles::empty()).is_err());
    }

    #[test]
    fn test_size_contains() {
        let size = Size::new(80, 24);
        assert!(size.contains(Position::new(79, 23)));
        assert!(!size.contains(Position::new(80, 0)));
        assert!(!size.contains(Position::new(0, 24)));
        assert_eq!(size.area(), 1920);
    }

    #[test]
    fn test_color_serde_by_name() {
        #[derive(Deserialize)]
        struct Wrapper {
            fg: Color,
            styles: Vec<Style>,
        }
        let w: Wrapper = toml::from_str("fg = \"cyan\"\nstyles = [\"blink\", \"reverse\"]").unwrap();
        assert_eq!(w.fg, Color::Cyan);
        assert_eq!(w.styles, vec![Style::Blink, Style::Reverse]);
        assert!(toml::from_str::<Wrapper>("fg = \"mauve\"\nstyles = []").is_err());
    }
}
