//! Keyboard and mouse input
//!
//! Devices decode escape sequences; this module only turns the decoded
//! crossterm events into [`Keystroke`]s.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton as CtMouseButton, MouseEvent,
    MouseEventKind,
};

use crate::core::{Key, Keystroke, Modifiers, MouseAction, MouseButton, MouseReport, Position};
use crate::core::keys::MAX_FUNCTION_KEY;
use crate::error::Result;

/// Keystroke source
pub trait Input {
    /// Next queued keystroke, or `None` right away when nothing is queued
    fn poll(&mut self) -> Result<Option<Keystroke>>;

    /// Block until a keystroke arrives
    ///
    /// Fails with `InputClosed` once the device is torn down.
    fn get(&mut self) -> Result<Keystroke>;
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Normalize a key event; releases yield nothing
pub fn normalize_key(event: &KeyEvent) -> Option<Keystroke> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let key = match event.code {
        KeyCode::Char(ch) => Key::Char(ch),
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,

        // Arrow keys
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,

        // Navigation keys
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,

        KeyCode::F(n) if (1..=MAX_FUNCTION_KEY).contains(&n) => Key::F(n),

        _ => Key::Unknown,
    };

    Some(Keystroke::new(key, Modifiers::from(event.modifiers)))
}

fn button(button: CtMouseButton) -> MouseButton {
    match button {
        CtMouseButton::Left => MouseButton::Left,
        CtMouseButton::Middle => MouseButton::Middle,
        CtMouseButton::Right => MouseButton::Right,
    }
}

/// Normalize a mouse event into a mouse report keystroke
pub fn normalize_mouse(event: &MouseEvent) -> Keystroke {
    let action = match event.kind {
        MouseEventKind::Down(b) => MouseAction::Press(button(b)),
        MouseEventKind::Up(b) => MouseAction::Release(button(b)),
        MouseEventKind::Drag(b) => MouseAction::Drag(button(b)),
        MouseEventKind::Moved => MouseAction::Move,
        MouseEventKind::ScrollUp => MouseAction::ScrollUp,
        MouseEventKind::ScrollDown => MouseAction::ScrollDown,
        MouseEventKind::ScrollLeft => MouseAction::ScrollLeft,
        MouseEventKind::ScrollRight => MouseAction::ScrollRight,
    };
    let report = MouseReport {
        action,
        position: Position::new(event.column, event.row),
    };
    Keystroke::new(Key::Mouse(report), Modifiers::from(event.modifiers))
}

pub fn cursor_report(pos: Position) -> Keystroke {
    Keystroke::plain(Key::CursorLocation(pos))
}
