//! Normalized keystrokes
//!
//! A [`Keystroke`] is one input event: a key category, the modifier flags
//! held while it was pressed and, for ordinary characters, the character.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use super::style::{normalize_name, Position};
use crate::error::{Error, Result};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

/// Highest function key number the registry knows
pub const MAX_FUNCTION_KEY: u8 = 19;

/// Key category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// An ordinary character
    Char(char),
    Escape,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// Function key F1-F19
    F(u8),
    Tab,
    /// Shift+Tab
    BackTab,
    Enter,
    Insert,
    Delete,
    /// A key the device decoded but the registry has no category for
    Unknown,
    /// Input stream ended
    Eof,
    /// Reply to a cursor location query
    CursorLocation(Position),
    /// Mouse report
    Mouse(MouseReport),
}

/// What the mouse did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Press(MouseButton),
    Release(MouseButton),
    Drag(MouseButton),
    Move,
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// A mouse event at a cell position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MouseReport {
    pub action: MouseAction,
    pub position: Position,
}

/// Named keys, in the order `Key::name` reports them
const NAMED_KEYS: [(Key, &str); 16] = [
    (Key::Escape, "escape"),
    (Key::Backspace, "backspace"),
    (Key::Up, "up"),
    (Key::Down, "down"),
    (Key::Left, "left"),
    (Key::Right, "right"),
    (Key::Home, "home"),
    (Key::End, "end"),
    (Key::PageUp, "page-up"),
    (Key::PageDown, "page-down"),
    (Key::Tab, "tab"),
    (Key::BackTab, "back-tab"),
    (Key::Enter, "enter"),
    (Key::Insert, "insert"),
    (Key::Delete, "delete"),
    (Key::Unknown, "unknown"),
];

impl Key {
    /// Symbolic name of the key category
    ///
    /// Characters report `"char"`; function keys report `"f1"` ... `"f19"`.
    pub fn name(&self) -> String {
        match self {
            Key::Char(_) => "char".to_string(),
            Key::F(n) => format!("f{}", n),
            Key::Eof => "eof".to_string(),
            Key::CursorLocation(_) => "cursor-location".to_string(),
            Key::Mouse(_) => "mouse".to_string(),
            named => NAMED_KEYS
                .iter()
                .find(|(key, _)| key == named)
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    /// Whether this is a meta-event rather than a key press
    pub fn is_meta(&self) -> bool {
        matches!(self, Key::CursorLocation(_) | Key::Mouse(_))
    }
}

impl FromStr for Key {
    type Err = Error;

    /// Parse a key name; a single character parses as `Key::Char`
    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if !ch.is_control() {
                return Ok(Key::Char(ch));
            }
        }

        let name = normalize_name(s);
        match name.as_str() {
            "esc" => return Ok(Key::Escape),
            "return" => return Ok(Key::Enter),
            "pageup" => return Ok(Key::PageUp),
            "pagedown" => return Ok(Key::PageDown),
            "backtab" | "reverse-tab" => return Ok(Key::BackTab),
            "eof" => return Ok(Key::Eof),
            _ => {}
        }
        if let Some(key) = NAMED_KEYS.iter().find(|(_, n)| *n == name).map(|(k, _)| *k) {
            return Ok(key);
        }
        if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            if (1..=MAX_FUNCTION_KEY).contains(&n) {
                return Ok(Key::F(n));
            }
        }
        Err(Error::invalid_attribute("key", s))
    }
}

/// One normalized input event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Keystroke {
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub const fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::empty())
    }

    /// The literal character for `Key::Char` keystrokes
    pub fn char(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) => Some(ch),
            _ => None,
        }
    }

    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl() {
            f.write_str("ctrl+")?;
        }
        if self.alt() {
            f.write_str("alt+")?;
        }
        if self.shift() {
            f.write_str("shift+")?;
        }
        match self.key {
            Key::Char(' ') => f.write_str("space"),
            Key::Char(ch) => write!(f, "{}", ch),
            Key::CursorLocation(pos) => write!(f, "cursor-location({},{})", pos.col, pos.row),
            Key::Mouse(report) => write!(
                f,
                "mouse({:?} at {},{})",
                report.action, report.position.col, report.position.row
            ),
            key => f.write_str(&key.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_round_trip() {
        for (key, name) in NAMED_KEYS {
            assert_eq!(key.name(), name);
            assert_eq!(name.parse::<Key>().unwrap(), key);
        }
        assert_eq!("F19".parse::<Key>().unwrap(), Key::F(19));
        assert_eq!(Key::F(7).name(), "f7");
        assert_eq!("page_up".parse::<Key>().unwrap(), Key::PageUp);
        assert_eq!("x".parse::<Key>().unwrap(), Key::Char('x'));
    }

    #[test]
    fn test_unknown_key_name() {
        assert!(matches!(
            "f20".parse::<Key>(),
            Err(Error::InvalidAttribute { kind: "key", .. })
        ));
        assert!("hyper".parse::<Key>().is_err());
    }

    #[test]
    fn test_keystroke_display() {
        let ks = Keystroke::new(Key::Char('c'), Modifiers::CTRL);
        assert_eq!(ks.to_string(), "ctrl+c");
        assert_eq!(ks.char(), Some('c'));

        let ks = Keystroke::new(Key::BackTab, Modifiers::SHIFT);
        assert_eq!(ks.to_string(), "shift+back-tab");
        assert_eq!(ks.char(), None);
    }

    #[test]
    fn test_meta_events() {
        assert!(Key::CursorLocation(Position::new(1, 2)).is_meta());
        assert!(!Key::Enter.is_meta());
    }
}
