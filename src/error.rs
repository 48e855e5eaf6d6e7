//! Error types for encoding and decoding.

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Codec error types.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The frequency file contains a malformed line.
    #[error("malformed frequency table at line {line}: {message}")]
    Format { line: usize, message: String },

    /// The tree builder was handed a table with no symbols.
    #[error("cannot build a code from empty input")]
    EmptyInput,

    /// A symbol seen during the encode pass has no code.
    #[error("symbol 0x{symbol:02x} has no code in the code table")]
    Internal { symbol: u8 },

    /// The encoded bit stream does not match the tree.
    #[error("corrupt stream: {message}")]
    CorruptStream { message: String },
}

impl Error {
    /// Create a format error for the given 1-based line.
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }

    /// Create a corrupt stream error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Error::CorruptStream {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_names_line() {
        let err = Error::format(3, "missing ':'");
        assert_eq!(
            err.to_string(),
            "malformed frequency table at line 3: missing ':'"
        );
    }

    #[test]
    fn internal_error_shows_hex_symbol() {
        let err = Error::Internal { symbol: 0x0a };
        assert!(err.to_string().contains("0x0a"));
    }

    #[test]
    fn io_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
