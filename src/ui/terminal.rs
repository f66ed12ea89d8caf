//! Immediate-mode terminal backend
//!
//! Every write goes straight to the device; the only buffering is the
//! device's own, released by `flush` (or a write with `flush` set).
//! `start`/`stop` enter and leave the alternate screen so whatever the
//! terminal showed before comes back afterwards.

use std::time::Duration;

use tracing::{debug, warn};

use super::input::{cursor_report, normalize_key, normalize_mouse, Input};
use super::output::{check_text, DrawOptions, Lifecycle, Output, Pen};
use super::resize::{ResizeHandle, ResizeHub};
use crate::config::{BackendKind, Charset, Config};
use crate::core::style::check_drawable;
use crate::core::{Color, Key, Keystroke, Position, Size, StyledCell, Styles};
use crate::device::{ConsoleDevice, Device, DeviceEvent, MemoryDevice, MemoryMonitor};
use crate::error::{Error, Result};

/// Terminal backend
pub struct Terminal {
    device: Box<dyn Device>,
    title: String,
    charset: Charset,
    font: String,
    font_size: u16,
    lifecycle: Lifecycle,
    hub: ResizeHub,
    pen: Pen,
    cursor: Position,
    /// Device cursor, when known
    device_cursor: Option<Position>,
    /// Attributes last sent to the device
    device_attrs: Option<(Color, Color, Styles)>,
    /// End of input was already reported
    input_ended: bool,
}

impl Terminal {
    /// Build a terminal on the device the config asks for
    pub fn open(config: Config) -> Result<Self> {
        match config.backend {
            BackendKind::Console => {
                let device = ConsoleDevice::open(config.get_palette(), config.mouse)?;
                Self::with_device(config, Box::new(device))
            }
            BackendKind::Headless => Self::headless(config).map(|(terminal, _)| terminal),
        }
    }

    /// Build a terminal on an in-memory device sized from the config
    pub fn headless(config: Config) -> Result<(Self, MemoryMonitor)> {
        let device = MemoryDevice::new(Size::new(config.cols, config.rows));
        let monitor = device.monitor();
        Ok((Self::with_device(config, Box::new(device))?, monitor))
    }

    pub fn with_device(mut config: Config, mut device: Box<dyn Device>) -> Result<Self> {
        let size = device.size()?;
        let hub = ResizeHub::new(size);
        device.watch_resize(hub.clone())?;
        if let Some(listener) = config.resize_listener.take() {
            hub.subscribe_shared(listener.0);
        }
        let font = config.resolve_font(|name| device.font_available(name));
        debug!("Terminal created: {} font={:?} charset={:?}", size, font, config.charset);

        Ok(Self {
            device,
            title: config.title,
            charset: config.charset,
            font,
            font_size: config.font_size,
            lifecycle: Lifecycle::Uninitialized,
            hub,
            pen: Pen::default(),
            cursor: Position::default(),
            device_cursor: None,
            device_attrs: None,
            input_ended: false,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Font chosen from the configured candidates
    pub fn font(&self) -> &str {
        &self.font
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub(crate) fn hub(&self) -> &ResizeHub {
        &self.hub
    }

    /// Send one cell to the device; false if `pos` is outside the terminal
    pub(crate) fn emit(&mut self, pos: Position, cell: &StyledCell) -> Result<bool> {
        if !self.size().contains(pos) {
            return Ok(false);
        }
        if self.device_cursor != Some(pos) {
            self.device.move_to(pos)?;
        }
        let attrs = (cell.fg, cell.bg, cell.styles);
        if self.device_attrs != Some(attrs) {
            self.device.set_attrs(cell.fg, cell.bg, cell.styles)?;
            self.device_attrs = Some(attrs);
        }
        self.device.put_char(self.charset.encode(cell.ch))?;
        // Drawable characters are one column wide
        self.device_cursor = Some(pos.right(1));
        Ok(true)
    }

    /// Park the device cursor at `pos` when it is on screen
    pub(crate) fn place_cursor(&mut self, pos: Position) -> Result<()> {
        if self.size().contains(pos) && self.device_cursor != Some(pos) {
            self.device.move_to(pos)?;
            self.device_cursor = Some(pos);
        }
        Ok(())
    }

    pub(crate) fn begin_frame(&mut self) -> Result<()> {
        Ok(self.device.begin_frame()?)
    }

    pub(crate) fn end_frame(&mut self) -> Result<()> {
        Ok(self.device.end_frame()?)
    }

    fn write_cells(&mut self, s: &str, pos: Position, opts: &DrawOptions) -> Result<Position> {
        let (fg, bg, styles) = self.pen.resolve(opts);
        let mut pos = pos;
        for ch in s.chars() {
            self.emit(pos, &StyledCell { ch, fg, bg, styles })?;
            pos = pos.right(1);
        }
        Ok(pos)
    }

    fn read(&mut self, timeout: Option<Duration>) -> Result<Option<Keystroke>> {
        self.lifecycle.ensure_started()?;
        if self.input_ended {
            return Err(Error::InputClosed);
        }
        loop {
            let event = match self.device.read_event(timeout).map_err(Error::from_input)? {
                Some(event) => event,
                None if timeout.is_some() => return Ok(None),
                None => continue,
            };
            match event {
                DeviceEvent::Key(key) => {
                    if let Some(keystroke) = normalize_key(&key) {
                        return Ok(Some(keystroke));
                    }
                }
                DeviceEvent::Mouse(mouse) => return Ok(Some(normalize_mouse(&mouse))),
                DeviceEvent::CursorReport(pos) => return Ok(Some(cursor_report(pos))),
                DeviceEvent::Resize(size) => {
                    self.hub.confirm(size);
                }
                DeviceEvent::EndOfInput => {
                    self.input_ended = true;
                    return Ok(Some(Keystroke::plain(Key::Eof)));
                }
            }
        }
    }
}

impl Output for Terminal {
    fn write_char(&mut self, ch: char, pos: Option<Position>, opts: &DrawOptions) -> Result<&mut Self> {
        self.lifecycle.ensure_started()?;
        check_drawable(ch)?;
        let mut buf = [0u8; 4];
        let pos = pos.unwrap_or(self.cursor);
        self.cursor = self.write_cells(ch.encode_utf8(&mut buf), pos, opts)?;
        if opts.flush {
            self.device.flush()?;
        }
        Ok(self)
    }

    fn write_str(&mut self, s: &str, pos: Option<Position>, opts: &DrawOptions) -> Result<&mut Self> {
        self.lifecycle.ensure_started()?;
        check_text(s)?;
        let pos = pos.unwrap_or(self.cursor);
        self.cursor = self.write_cells(s, pos, opts)?;
        if opts.flush {
            self.device.flush()?;
        }
        Ok(self)
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, pos: Position) -> Result<&mut Self> {
        self.lifecycle.ensure_started()?;
        self.cursor = pos;
        self.place_cursor(pos)?;
        Ok(self)
    }

    fn flush(&mut self) -> Result<&mut Self> {
        self.device.flush()?;
        Ok(self)
    }

    fn clear(&mut self) -> Result<&mut Self> {
        self.lifecycle.ensure_started()?;
        self.device.clear()?;
        self.device_attrs = None;
        self.device_cursor = None;
        self.cursor = Position::default();
        self.place_cursor(self.cursor)?;
        self.device.flush()?;
        Ok(self)
    }

    fn start(&mut self) -> Result<&mut Self> {
        if self.lifecycle == Lifecycle::Started {
            return Ok(self);
        }
        self.device.enter(&self.title)?;
        // The device may have been resized while stopped
        let size = self.device.size()?;
        self.hub.confirm(size);

        self.lifecycle = Lifecycle::Started;
        self.cursor = Position::default();
        self.device_cursor = Some(self.cursor);
        self.device_attrs = None;
        debug!("Terminal started ({})", size);
        Ok(self)
    }

    fn stop(&mut self) -> Result<&mut Self> {
        if self.lifecycle != Lifecycle::Started {
            return Ok(self);
        }
        self.lifecycle = Lifecycle::Stopped;
        self.device_cursor = None;
        self.device_attrs = None;
        self.device.leave()?;
        debug!("Terminal stopped");
        Ok(self)
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn size(&self) -> Size {
        self.hub.size()
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
        self.hub.subscribe(callback)
    }

    fn unsubscribe_resize(&mut self, handle: ResizeHandle) -> bool {
        self.hub.unsubscribe(handle)
    }
}

impl Input for Terminal {
    fn poll(&mut self) -> Result<Option<Keystroke>> {
        self.read(Some(Duration::ZERO))
    }

    fn get(&mut self) -> Result<Keystroke> {
        self.read(None)?.ok_or(Error::InputClosed)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.lifecycle == Lifecycle::Started {
            if let Err(e) = self.stop() {
                warn!("Failed to stop terminal: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Modifiers, Style};
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn headless(cols: u16, rows: u16) -> (Terminal, MemoryMonitor) {
        let config = Config {
            cols,
            rows,
            backend: BackendKind::Headless,
            ..Config::default()
        };
        Terminal::headless(config).unwrap()
    }

    fn started(cols: u16, rows: u16) -> (Terminal, MemoryMonitor) {
        let (mut term, monitor) = headless(cols, rows);
        term.start().unwrap();
        (term, monitor)
    }

    #[test]
    fn test_write_goes_straight_to_device() {
        let (mut term, monitor) = started(80, 24);
        term.write_str("hi", Some(Position::new(0, 0)), &DrawOptions::new().fg(Color::Red))
            .unwrap();

        assert_eq!(&monitor.row_text(0)[..2], "hi");
        for col in 0..2 {
            let cell = monitor.cell(Position::new(col, 0)).unwrap();
            assert_eq!(cell.fg, Color::Red);
            assert_eq!(cell.bg, Color::Default);
        }
        assert_eq!(term.cursor(), Position::new(2, 0));
        assert_eq!(monitor.cursor(), Position::new(2, 0));
        assert_eq!(monitor.flushes(), 1);
    }

    #[test]
    fn test_deferred_flush() {
        let (mut term, monitor) = started(10, 2);
        monitor.reset_counters();
        let opts = DrawOptions::new().flush(false);
        term.write_char('a', None, &opts).unwrap();
        term.write_char('b', None, &opts).unwrap();
        assert_eq!(monitor.flushes(), 0);
        assert_eq!(&monitor.row_text(0)[..2], "ab");
        term.flush().unwrap();
        assert_eq!(monitor.flushes(), 1);
    }

    #[test]
    fn test_ambient_pen() {
        let (mut term, monitor) = started(10, 1);
        term.set_fg(Color::Green).set_styles(Style::Underline.into());
        term.write_char('x', None, &DrawOptions::new()).unwrap();
        term.write_char('y', None, &DrawOptions::new().fg(Color::Blue)).unwrap();

        let x = monitor.cell(Position::new(0, 0)).unwrap();
        assert_eq!((x.fg, x.styles), (Color::Green, Styles::UNDERLINE));
        let y = monitor.cell(Position::new(1, 0)).unwrap();
        assert_eq!((y.fg, y.styles), (Color::Blue, Styles::UNDERLINE));
        assert_eq!(term.fg(), Color::Green);
    }

    #[test]
    fn test_requires_start() {
        let (mut term, _monitor) = headless(10, 1);
        assert!(matches!(
            term.write_char('x', None, &DrawOptions::new()),
            Err(Error::InactiveOutput)
        ));
        assert!(matches!(term.poll(), Err(Error::InactiveOutput)));

        term.start().unwrap();
        term.stop().unwrap();
        assert!(matches!(term.clear(), Err(Error::InactiveOutput)));
    }

    #[test]
    fn test_stop_twice_matches_stop_once() {
        let (mut term, monitor) = headless(10, 2);
        let before = monitor.snapshot();
        term.start().unwrap();
        assert!(monitor.in_alternate());
        term.write_str("drawn", None, &DrawOptions::new()).unwrap();

        term.stop().unwrap();
        let once = monitor.snapshot();
        term.stop().unwrap();
        assert_eq!(monitor.snapshot(), once);
        assert_eq!(once, before);
        assert!(!monitor.in_alternate());
        assert_eq!(term.lifecycle(), Lifecycle::Stopped);
    }

    #[test]
    fn test_start_is_idempotent_and_restartable() {
        let (mut term, monitor) = headless(10, 2);
        term.start().unwrap();
        term.write_char('k', None, &DrawOptions::new()).unwrap();
        term.start().unwrap();
        assert_eq!(monitor.cell(Position::new(0, 0)).unwrap().ch, 'k');

        term.stop().unwrap();
        term.start().unwrap();
        assert_eq!(term.lifecycle(), Lifecycle::Started);
        assert!(monitor.in_alternate());
    }

    #[test]
    fn test_drop_leaves_alternate_screen() {
        let (term, monitor) = started(4, 1);
        drop(term);
        assert!(!monitor.in_alternate());
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let (mut term, monitor) = started(4, 1);
        monitor.reset_counters();
        term.write_str("abcdef", Some(Position::new(2, 0)), &DrawOptions::new())
            .unwrap();
        assert_eq!(monitor.row_text(0), "  ab");
        assert_eq!(monitor.chars_written(), 2);
        assert_eq!(term.cursor(), Position::new(8, 0));

        term.write_char('z', Some(Position::new(0, 5)), &DrawOptions::new())
            .unwrap();
        assert_eq!(monitor.chars_written(), 2);
    }

    #[test]
    fn test_invalid_character_writes_nothing() {
        let (mut term, monitor) = started(10, 1);
        monitor.reset_counters();
        assert!(matches!(
            term.write_str("ok\u{7}", None, &DrawOptions::new()),
            Err(Error::InvalidCharacter('\u{7}'))
        ));
        assert_eq!(monitor.chars_written(), 0);
        assert_eq!(term.cursor(), Position::new(0, 0));
    }

    #[test]
    fn test_cells_wider_or_narrower_than_one_column_are_rejected() {
        let (mut term, monitor) = started(10, 2);
        monitor.reset_counters();
        for text in ["e\u{301}x", "\u{65e5}x"] {
            assert!(matches!(
                term.write_str(text, Some(Position::new(0, 1)), &DrawOptions::new()),
                Err(Error::InvalidCharacter(_))
            ));
        }
        assert!(term.write_char('\u{6f22}', None, &DrawOptions::new()).is_err());
        assert_eq!(monitor.chars_written(), 0);
        assert_eq!(monitor.row_text(1), " ".repeat(10));
        assert_eq!(term.cursor(), Position::new(0, 0));
    }

    /// Device that records the operations it receives
    struct Recorder {
        ops: Arc<Mutex<Vec<String>>>,
    }

    impl Device for Recorder {
        fn size(&self) -> std::io::Result<Size> {
            Ok(Size::new(10, 3))
        }
        fn enter(&mut self, _title: &str) -> std::io::Result<()> {
            Ok(())
        }
        fn leave(&mut self) -> std::io::Result<()> {
            Ok(())
        }
        fn move_to(&mut self, pos: Position) -> std::io::Result<()> {
            self.ops.lock().unwrap().push(format!("move({},{})", pos.col, pos.row));
            Ok(())
        }
        fn set_attrs(&mut self, _fg: Color, _bg: Color, _styles: Styles) -> std::io::Result<()> {
            self.ops.lock().unwrap().push("attrs".to_string());
            Ok(())
        }
        fn put_char(&mut self, ch: char) -> std::io::Result<()> {
            self.ops.lock().unwrap().push(format!("put({})", ch));
            Ok(())
        }
        fn clear(&mut self) -> std::io::Result<()> {
            Ok(())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
        fn read_event(&mut self, _timeout: Option<Duration>) -> std::io::Result<Option<DeviceEvent>> {
            Ok(None)
        }
    }

    #[test]
    fn test_device_cursor_tracks_written_cells() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let device = Recorder { ops: ops.clone() };
        let mut term = Terminal::with_device(Config::default(), Box::new(device)).unwrap();
        term.start().unwrap();

        term.write_str("\u{e9}x", Some(Position::new(0, 1)), &DrawOptions::new())
            .unwrap();
        term.write_str("yz", None, &DrawOptions::new()).unwrap();
        term.write_char('w', Some(Position::new(5, 1)), &DrawOptions::new())
            .unwrap();
        assert_eq!(
            *ops.lock().unwrap(),
            vec!["move(0,1)", "attrs", "put(\u{e9})", "put(x)", "put(y)", "put(z)", "move(5,1)", "put(w)"]
        );
        assert_eq!(term.cursor(), Position::new(6, 1));
    }

    #[test]
    fn test_cursor_round_trip() {
        let (mut term, monitor) = started(20, 5);
        for pos in [Position::new(0, 0), Position::new(19, 4), Position::new(7, 2)] {
            term.set_cursor(pos).unwrap();
            assert_eq!(term.cursor(), pos);
            assert_eq!(monitor.cursor(), pos);
        }
    }

    #[test]
    fn test_clear_homes_cursor() {
        let (mut term, monitor) = started(5, 2);
        term.write_str("xy", Some(Position::new(1, 1)), &DrawOptions::new()).unwrap();
        term.clear().unwrap();
        assert_eq!(monitor.row_text(1), "     ");
        assert_eq!(term.cursor(), Position::new(0, 0));
    }

    #[test]
    fn test_ascii_charset_substitutes() {
        let config = Config {
            cols: 4,
            rows: 1,
            charset: Charset::Ascii,
            ..Config::default()
        };
        let (mut term, monitor) = Terminal::headless(config).unwrap();
        term.start().unwrap();
        term.write_str("aé", None, &DrawOptions::new()).unwrap();
        assert_eq!(monitor.row_text(0), "a?  ");
    }

    #[test]
    fn test_poll_returns_immediately() {
        let (mut term, monitor) = started(4, 1);
        assert_eq!(term.poll().unwrap(), None);

        monitor.push_char('q');
        assert_eq!(term.poll().unwrap(), Some(Keystroke::plain(Key::Char('q'))));
        assert_eq!(term.poll().unwrap(), None);
    }

    #[test]
    fn test_get_blocks_until_key() {
        let (mut term, monitor) = started(4, 1);
        let pusher = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            monitor.push_key(KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT));
        });
        let keystroke = term.get().unwrap();
        assert_eq!(keystroke, Keystroke::new(Key::Left, Modifiers::SHIFT));
        pusher.join().unwrap();
    }

    #[test]
    fn test_key_releases_are_skipped() {
        let (mut term, monitor) = started(4, 1);
        monitor.push_key(KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        monitor.push_char('b');
        assert_eq!(term.get().unwrap().char(), Some('b'));
    }

    #[test]
    fn test_end_of_input_then_closed() {
        let (mut term, monitor) = started(4, 1);
        monitor.end_input();
        assert_eq!(term.get().unwrap().key, Key::Eof);
        assert!(matches!(term.get(), Err(Error::InputClosed)));
        assert!(matches!(term.poll(), Err(Error::InputClosed)));
    }

    #[test]
    fn test_closed_device_unblocks_get() {
        let (mut term, monitor) = started(4, 1);
        let closer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            monitor.close();
        });
        assert!(matches!(term.get(), Err(Error::InputClosed)));
        closer.join().unwrap();
    }

    #[test]
    fn test_resize_events_are_absorbed() {
        let (mut term, monitor) = started(10, 5);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        term.subscribe_resize(move |cols, rows| log.lock().unwrap().push((cols, rows)));

        monitor.resize(Size::new(100, 30));
        monitor.push_char('r');
        assert_eq!(term.get().unwrap().char(), Some('r'));
        assert_eq!(term.size(), Size::new(100, 30));
        // confirmed by the monitor, then again from the input stream
        assert_eq!(*seen.lock().unwrap(), vec![(100, 30)]);
    }

    #[test]
    fn test_resize_listener_from_config() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let config = Config {
            cols: 10,
            rows: 5,
            ..Config::default()
        }
        .with_resize_listener(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (mut term, monitor) = Terminal::headless(config).unwrap();
        monitor.resize(Size::new(12, 6));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let handle = term.subscribe_resize(|_, _| {});
        assert!(term.unsubscribe_resize(handle));
        assert!(!term.unsubscribe_resize(handle));
    }

    #[test]
    fn test_font_resolution() {
        let config = Config {
            font: vec!["Nope Mono".to_string(), "Iosevka".to_string()],
            ..Config::default()
        };
        let device = MemoryDevice::new(Size::new(4, 1)).with_fonts(["Iosevka", "Menlo"]);
        let term = Terminal::with_device(config, Box::new(device)).unwrap();
        assert_eq!(term.font(), "Iosevka");
        assert_eq!(term.font_size(), 14);
        assert_eq!(term.title(), "terminal");
    }
}
