//! Headless in-memory device
//!
//! Models what a real terminal would show: a primary and an alternate grid,
//! a cursor and the current attributes. Input events are queued by a
//! [`MemoryMonitor`], which also lets the owner resize the "window", end or
//! tear down input, and inspect the visible state.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use unicode_width::UnicodeWidthChar;

use super::{Device, DeviceEvent};
use crate::core::{Color, Grid, Position, Size, StyledCell, Styles};
use crate::ui::resize::ResizeHub;

struct MemoryState {
    size: Size,
    primary: Grid,
    /// Present while the alternate screen is entered
    alternate: Option<Grid>,
    cursor: Position,
    saved_cursor: Position,
    fg: Color,
    bg: Color,
    styles: Styles,
    title: String,
    chars_written: usize,
    flushes: usize,
    queue: VecDeque<DeviceEvent>,
    closed: bool,
    hub: Option<ResizeHub>,
    fonts: Option<Vec<String>>,
}

impl MemoryState {
    fn visible_mut(&mut self) -> &mut Grid {
        match self.alternate.as_mut() {
            Some(grid) => grid,
            None => &mut self.primary,
        }
    }

    fn visible(&self) -> &Grid {
        self.alternate.as_ref().unwrap_or(&self.primary)
    }
}

struct Shared {
    state: Mutex<MemoryState>,
    input_ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// In-memory terminal
pub struct MemoryDevice {
    shared: Arc<Shared>,
}

impl MemoryDevice {
    pub fn new(size: Size) -> Self {
        let state = MemoryState {
            size,
            primary: Grid::new(size),
            alternate: None,
            cursor: Position::default(),
            saved_cursor: Position::default(),
            fg: Color::Default,
            bg: Color::Default,
            styles: Styles::empty(),
            title: String::new(),
            chars_written: 0,
            flushes: 0,
            queue: VecDeque::new(),
            closed: false,
            hub: None,
            fonts: None,
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                input_ready: Condvar::new(),
            }),
        }
    }

    /// Restrict the fonts this device reports as installed
    pub fn with_fonts<S: Into<String>>(self, fonts: impl IntoIterator<Item = S>) -> Self {
        self.shared.lock().fonts = Some(fonts.into_iter().map(Into::into).collect());
        self
    }

    /// A handle for driving and inspecting this device from outside
    pub fn monitor(&self) -> MemoryMonitor {
        MemoryMonitor {
            shared: self.shared.clone(),
        }
    }
}

impl Device for MemoryDevice {
    fn size(&self) -> io::Result<Size> {
        Ok(self.shared.lock().size)
    }

    fn enter(&mut self, title: &str) -> io::Result<()> {
        let mut state = self.shared.lock();
        if state.alternate.is_none() {
            state.saved_cursor = state.cursor;
            state.alternate = Some(Grid::new(state.size));
            state.cursor = Position::default();
        }
        state.title = title.to_string();
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        let mut state = self.shared.lock();
        if state.alternate.take().is_some() {
            state.cursor = state.saved_cursor;
            state.fg = Color::Default;
            state.bg = Color::Default;
            state.styles = Styles::empty();
        }
        Ok(())
    }

    fn move_to(&mut self, pos: Position) -> io::Result<()> {
        self.shared.lock().cursor = pos;
        Ok(())
    }

    fn set_attrs(&mut self, fg: Color, bg: Color, styles: Styles) -> io::Result<()> {
        let mut state = self.shared.lock();
        state.fg = fg;
        state.bg = bg;
        state.styles = styles;
        Ok(())
    }

    /// Print like a terminal would: zero-width characters neither land in a
    /// cell nor move the cursor, wide glyphs cover two cells.
    fn put_char(&mut self, ch: char) -> io::Result<()> {
        let mut state = self.shared.lock();
        state.chars_written += 1;
        let width = ch.width().unwrap_or(0) as u16;
        if width == 0 {
            return Ok(());
        }
        let mut cell = StyledCell {
            ch,
            fg: state.fg,
            bg: state.bg,
            styles: state.styles,
        };
        let pos = state.cursor;
        state.visible_mut().set(pos, cell);
        // The right half of a wide glyph
        cell.ch = ' ';
        for col in 1..width {
            state.visible_mut().set(pos.right(col), cell);
        }
        state.cursor = pos.right(width);
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.shared.lock().visible_mut().clear();
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.shared.lock().flushes += 1;
        Ok(())
    }

    fn read_event(&mut self, timeout: Option<Duration>) -> io::Result<Option<DeviceEvent>> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.lock();
        loop {
            if let Some(event) = state.queue.pop_front() {
                return Ok(Some(event));
            }
            if state.closed {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "memory device closed"));
            }
            state = match deadline {
                None => self
                    .shared
                    .input_ready
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    self.shared
                        .input_ready
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .0
                }
            };
        }
    }

    fn watch_resize(&mut self, hub: ResizeHub) -> io::Result<()> {
        self.shared.lock().hub = Some(hub);
        Ok(())
    }

    fn font_available(&self, name: &str) -> bool {
        match &self.shared.lock().fonts {
            Some(fonts) => fonts.iter().any(|f| f.eq_ignore_ascii_case(name)),
            None => true,
        }
    }
}

/// Driver and observer for a [`MemoryDevice`]
#[derive(Clone)]
pub struct MemoryMonitor {
    shared: Arc<Shared>,
}

impl MemoryMonitor {
    fn push(&self, event: DeviceEvent) {
        self.shared.lock().queue.push_back(event);
        self.shared.input_ready.notify_all();
    }

    pub fn push_key(&self, event: KeyEvent) {
        self.push(DeviceEvent::Key(event));
    }

    /// Queue a plain character keystroke
    pub fn push_char(&self, ch: char) {
        self.push_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
    }

    pub fn push_mouse(&self, event: MouseEvent) {
        self.push(DeviceEvent::Mouse(event));
    }

    pub fn push_cursor_report(&self, pos: Position) {
        self.push(DeviceEvent::CursorReport(pos));
    }

    /// Signal that no more input will arrive
    pub fn end_input(&self) {
        self.push(DeviceEvent::EndOfInput);
    }

    /// Tear the device down; blocked and later reads fail
    pub fn close(&self) {
        self.shared.lock().closed = true;
        self.shared.input_ready.notify_all();
    }

    /// Resize the "window"
    ///
    /// The new size is confirmed to the watching hub right away (as a signal
    /// handler would) and a resize event is queued on the input stream.
    pub fn resize(&self, size: Size) {
        let hub = {
            let mut state = self.shared.lock();
            state.size = size;
            state.primary.resize(size);
            if let Some(alt) = state.alternate.as_mut() {
                alt.resize(size);
            }
            state.queue.push_back(DeviceEvent::Resize(size));
            state.hub.clone()
        };
        self.shared.input_ready.notify_all();
        if let Some(hub) = hub {
            hub.confirm(size);
        }
    }

    pub fn size(&self) -> Size {
        self.shared.lock().size
    }

    /// Cell currently shown at `pos`
    pub fn cell(&self, pos: Position) -> Option<StyledCell> {
        self.shared.lock().visible().get(pos).copied()
    }

    /// Characters currently shown on a row
    pub fn row_text(&self, row: u16) -> String {
        self.shared
            .lock()
            .visible()
            .row(row)
            .map(|r| r.text())
            .unwrap_or_default()
    }

    /// Copy of everything currently shown
    pub fn snapshot(&self) -> Grid {
        self.shared.lock().visible().clone()
    }

    pub fn cursor(&self) -> Position {
        self.shared.lock().cursor
    }

    pub fn in_alternate(&self) -> bool {
        self.shared.lock().alternate.is_some()
    }

    pub fn title(&self) -> String {
        self.shared.lock().title.clone()
    }

    /// Characters put since creation or the last `reset_counters`
    pub fn chars_written(&self) -> usize {
        self.shared.lock().chars_written
    }

    pub fn flushes(&self) -> usize {
        self.shared.lock().flushes
    }

    pub fn reset_counters(&self) {
        let mut state = self.shared.lock();
        state.chars_written = 0;
        state.flushes = 0;
    }

    pub fn pending_events(&self) -> usize {
        self.shared.lock().queue.len()
    }
}
