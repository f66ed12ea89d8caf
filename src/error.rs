//! Error types
//!
//! Validation errors are raised by the call that triggered them, before any
//! visible state changes. `Io` means the device itself failed; the owning
//! `Terminal` or `Screen` should be discarded after it.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown {kind} name: {name:?}")]
    InvalidAttribute { kind: &'static str, name: String },

    #[error("Character {0:?} cannot be drawn in a cell")]
    InvalidCharacter(char),

    #[error("Output is not started")]
    InactiveOutput,

    #[error("Input device is closed")]
    InputClosed,

    #[error("Backend unavailable: {0}")]
    UnsupportedBackend(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Device I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn invalid_attribute(kind: &'static str, name: &str) -> Self {
        Error::InvalidAttribute {
            kind,
            name: name.to_string(),
        }
    }

    /// Classify a failed input read; a vanished stream is `InputClosed`
    pub(crate) fn from_input(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => Error::InputClosed,
            _ => Error::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_stream_maps_to_input_closed() {
        let err = Error::from_input(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(matches!(err, Error::InputClosed));

        let err = Error::from_input(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(matches!(err, Error::Io(_)));

        // output failures stay fatal I/O errors
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_messages() {
        let err = Error::invalid_attribute("color", "purple");
        assert_eq!(err.to_string(), "Unknown color name: \"purple\"");
        assert_eq!(Error::InvalidCharacter('\n').to_string(), "Character '\\n' cannot be drawn in a cell");
    }
}
