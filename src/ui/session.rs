//! Scoped display sessions
//!
//! [`SessionGuard`] starts an output and stops it again when dropped, so an
//! early return, an error or a panic never leaves the terminal in the
//! alternate screen.

use std::ops::{Deref, DerefMut};

use tracing::warn;

use super::output::Output;
use crate::error::Result;

/// Started output, stopped on drop
pub struct SessionGuard<'a, O: Output> {
    output: &'a mut O,
}

impl<'a, O: Output> SessionGuard<'a, O> {
    pub fn start(output: &'a mut O) -> Result<Self> {
        output.start()?;
        Ok(Self { output })
    }

    /// Stop now and report the outcome
    pub fn finish(self) -> Result<()> {
        let mut this = std::mem::ManuallyDrop::new(self);
        this.output.stop()?;
        Ok(())
    }
}

impl<O: Output> Deref for SessionGuard<'_, O> {
    type Target = O;

    fn deref(&self) -> &O {
        self.output
    }
}

impl<O: Output> DerefMut for SessionGuard<'_, O> {
    fn deref_mut(&mut self) -> &mut O {
        self.output
    }
}

impl<O: Output> Drop for SessionGuard<'_, O> {
    fn drop(&mut self) {
        if let Err(e) = self.output.stop() {
            warn!("Failed to stop session: {}", e);
        }
    }
}

/// Run `body` between `start` and `stop`
///
/// `stop` runs whatever `body` returns, and also when it panics. An error
/// from `body` wins over an error from `stop`.
pub fn with_session<O, T, F>(output: &mut O, body: F) -> Result<T>
where
    O: Output,
    F: FnOnce(&mut O) -> Result<T>,
{
    let mut guard = SessionGuard::start(output)?;
    let result = body(&mut guard);
    match result {
        Ok(value) => guard.finish().map(|_| value),
        Err(e) => {
            drop(guard);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::Position;
    use crate::error::Error;
    use crate::ui::output::{DrawOptions, Lifecycle};
    use crate::ui::screen::{RedrawMode, Screen};
    use crate::ui::terminal::Terminal;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn test_guard_stops_on_drop() {
        let (mut term, monitor) = Terminal::headless(Config::default()).unwrap();
        {
            let mut session = SessionGuard::start(&mut term).unwrap();
            assert!(monitor.in_alternate());
            session.write_str("inside", None, &DrawOptions::new()).unwrap();
        }
        assert!(!monitor.in_alternate());
        assert_eq!(term.lifecycle(), Lifecycle::Stopped);
    }

    #[test]
    fn test_with_session_returns_body_value() {
        let (mut screen, monitor) = Screen::headless(Config::default()).unwrap();
        let cursor = with_session(&mut screen, |s| {
            s.write_str("ok", Some(Position::new(0, 0)), &DrawOptions::new())?;
            s.redraw(RedrawMode::Complete)?;
            Ok(s.cursor())
        })
        .unwrap();
        assert_eq!(cursor, Position::new(2, 0));
        assert_eq!(screen.lifecycle(), Lifecycle::Stopped);
        assert!(!monitor.in_alternate());
    }

    #[test]
    fn test_with_session_stops_on_error() {
        let (mut screen, monitor) = Screen::headless(Config::default()).unwrap();
        let result: Result<()> = with_session(&mut screen, |s| {
            s.write_char('\n', None, &DrawOptions::new())?;
            Ok(())
        });
        assert!(matches!(result, Err(Error::InvalidCharacter('\n'))));
        assert!(!monitor.in_alternate());
    }

    #[test]
    fn test_with_session_stops_on_panic() {
        let (mut term, monitor) = Terminal::headless(Config::default()).unwrap();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: Result<()> = with_session(&mut term, |_| panic!("body failed"));
        }));
        assert!(outcome.is_err());
        assert!(!monitor.in_alternate());
    }
}
