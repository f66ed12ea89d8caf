//! Console device using crossterm
//!
//! Drives the process's own terminal: raw mode and the alternate screen on
//! enter, SGR attributes translated through a [`Palette`], output buffered
//! until flushed. On Unix a watcher thread turns SIGWINCH into resize
//! confirmations so subscribers hear about resizes even while nobody reads
//! input.
//!
//! crossterm answers cursor location queries internally, so this device never
//! reports [`DeviceEvent::CursorReport`]. A vanished input stream is reported
//! once as [`DeviceEvent::EndOfInput`].

use std::io::{self, BufWriter, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen, SetTitle,
    },
    tty::IsTty,
};
use tracing::debug;

use super::{Device, DeviceEvent};
use crate::config::Palette;
use crate::core::{Color, Position, Size, Style, Styles};
use crate::error::{Error, Result};
use crate::ui::resize::ResizeHub;

/// Begin/end synchronized output (DEC mode 2026), reduces flicker
const BEGIN_SYNC: &str = "\x1b[?2026h";
const END_SYNC: &str = "\x1b[?2026l";

/// Terminal device backed by crossterm
pub struct ConsoleDevice<W: Write = Stdout> {
    out: BufWriter<W>,
    palette: Palette,
    mouse: bool,
    entered: bool,
    #[cfg(unix)]
    watcher: Option<watcher::ResizeWatcher>,
}

impl ConsoleDevice<Stdout> {
    /// Open the controlling terminal
    ///
    /// Fails with `UnsupportedBackend` when stdout is not a terminal.
    pub fn open(palette: Palette, mouse: bool) -> Result<Self> {
        let stdout = io::stdout();
        require_terminal(&stdout)?;
        Ok(Self::with_writer(stdout, palette, mouse))
    }
}

fn require_terminal(stream: &impl IsTty) -> Result<()> {
    if !stream.is_tty() {
        return Err(Error::UnsupportedBackend(
            "stdout is not a terminal".to_string(),
        ));
    }
    Ok(())
}

impl<W: Write> ConsoleDevice<W> {
    /// Build a device that writes its escape sequences to `out`
    pub fn with_writer(out: W, palette: Palette, mouse: bool) -> Self {
        Self {
            out: BufWriter::with_capacity(65536, out),
            palette,
            mouse,
            entered: false,
            #[cfg(unix)]
            watcher: None,
        }
    }

    /// The writer underneath (buffered output not yet flushed stays behind)
    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    /// Undo `enter`, attempting every step even after one fails
    ///
    /// Returns the first failure.
    fn restore(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        self.entered = false;

        let mut first = None;
        let mut keep = |result: io::Result<()>| {
            if let Err(e) = result {
                first.get_or_insert(e);
            }
        };
        if self.mouse {
            keep(execute!(self.out, DisableMouseCapture));
        }
        keep(execute!(self.out, ResetColor, SetAttribute(Attribute::Reset)));
        keep(execute!(self.out, Show));
        keep(execute!(self.out, EnableLineWrap));
        keep(execute!(self.out, LeaveAlternateScreen));
        // Raw mode goes last so the shell gets a sane terminal back
        keep(terminal::disable_raw_mode());

        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Device event for a crossterm read
fn decode(read: io::Result<Event>) -> io::Result<Option<DeviceEvent>> {
    let event = match read {
        Ok(Event::Key(key)) => DeviceEvent::Key(key),
        Ok(Event::Mouse(mouse)) => DeviceEvent::Mouse(mouse),
        Ok(Event::Resize(cols, rows)) => DeviceEvent::Resize(Size::new(cols, rows)),
        Ok(other) => {
            debug!("Ignoring console event: {:?}", other);
            return Ok(None);
        }
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            debug!("Console input ended: {}", e);
            DeviceEvent::EndOfInput
        }
        Err(e) => return Err(e),
    };
    Ok(Some(event))
}

/// crossterm attribute for a style
fn attribute(style: Style) -> Attribute {
    match style {
        Style::Bold => Attribute::Bold,
        Style::Reverse => Attribute::Reverse,
        Style::Blink => Attribute::SlowBlink,
        Style::Underline => Attribute::Underlined,
        Style::Circled => Attribute::Encircled,
        Style::Strikethrough => Attribute::CrossedOut,
        Style::Fraktur => Attribute::Fraktur,
    }
}

impl<W: Write + Send> Device for ConsoleDevice<W> {
    fn size(&self) -> io::Result<Size> {
        terminal::size().map(Size::from)
    }

    fn enter(&mut self, title: &str) -> io::Result<()> {
        if self.entered {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        queue!(
            self.out,
            EnterAlternateScreen,
            SetTitle(title),
            DisableLineWrap,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        if self.mouse {
            queue!(self.out, EnableMouseCapture)?;
        }
        self.out.flush()?;
        self.entered = true;
        debug!("Console entered alternate screen");
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        self.restore()?;
        debug!("Console left alternate screen");
        Ok(())
    }

    fn move_to(&mut self, pos: Position) -> io::Result<()> {
        queue!(self.out, MoveTo(pos.col, pos.row))
    }

    fn set_attrs(&mut self, fg: Color, bg: Color, styles: Styles) -> io::Result<()> {
        // Reset first
        queue!(self.out, SetAttribute(Attribute::Reset))?;

        for style in styles.members() {
            queue!(self.out, SetAttribute(attribute(style)))?;
        }

        let fg_color = self.palette.resolve(fg);
        if fg_color != crossterm::style::Color::Reset {
            queue!(self.out, SetForegroundColor(fg_color))?;
        }
        let bg_color = self.palette.resolve(bg);
        if bg_color != crossterm::style::Color::Reset {
            queue!(self.out, SetBackgroundColor(bg_color))?;
        }
        Ok(())
    }

    fn put_char(&mut self, ch: char) -> io::Result<()> {
        queue!(self.out, Print(ch))
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            ResetColor,
            SetAttribute(Attribute::Reset),
            Clear(ClearType::All)
        )
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn begin_frame(&mut self) -> io::Result<()> {
        self.out.write_all(BEGIN_SYNC.as_bytes())?;
        queue!(self.out, Hide)
    }

    fn end_frame(&mut self) -> io::Result<()> {
        queue!(self.out, Show)?;
        self.out.write_all(END_SYNC.as_bytes())
    }

    fn read_event(&mut self, timeout: Option<Duration>) -> io::Result<Option<DeviceEvent>> {
        if let Some(timeout) = timeout {
            if !event::poll(timeout)? {
                return Ok(None);
            }
        }
        decode(event::read())
    }

    #[cfg(unix)]
    fn watch_resize(&mut self, hub: ResizeHub) -> io::Result<()> {
        if self.watcher.is_none() {
            self.watcher = Some(watcher::ResizeWatcher::spawn(hub)?);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn watch_resize(&mut self, _hub: ResizeHub) -> io::Result<()> {
        // Resizes still arrive through the input stream
        Ok(())
    }
}

impl<W: Write> Drop for ConsoleDevice<W> {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
        if let Err(e) = self.restore() {
            debug!("Console restore on drop failed: {}", e);
        }
    }
}

#[cfg(unix)]
mod watcher {
    use std::io;
    use std::thread::{self, JoinHandle};

    use crossterm::terminal;
    use signal_hook::consts::SIGWINCH;
    use signal_hook::iterator::{Handle, Signals};
    use tracing::debug;

    use crate::core::Size;
    use crate::ui::resize::ResizeHub;

    /// Thread confirming the terminal size on every SIGWINCH
    pub(super) struct ResizeWatcher {
        handle: Handle,
        thread: Option<JoinHandle<()>>,
    }

    impl ResizeWatcher {
        pub(super) fn spawn(hub: ResizeHub) -> io::Result<Self> {
            let mut signals = Signals::new([SIGWINCH])?;
            let handle = signals.handle();

            let thread = thread::Builder::new()
                .name("resize-watcher".to_string())
                .spawn(move || {
                    for _ in signals.forever() {
                        match terminal::size() {
                            Ok((cols, rows)) => {
                                hub.confirm(Size::new(cols, rows));
                            }
                            Err(e) => debug!("Size query after SIGWINCH failed: {}", e),
                        }
                    }
                })?;

            Ok(Self {
                handle,
                thread: Some(thread),
            })
        }

        pub(super) fn stop(mut self) {
            self.handle.close();
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }
}
