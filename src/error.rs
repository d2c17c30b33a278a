//! Error types for unit file parsing and word splitting.
//!
//! Errors fall into two families that callers treat differently:
//!
//! - **Parse errors** reject a whole unit file. They carry the 1-based line
//!   number of the logical line that failed.
//! - **Tokenize errors** reject a single multi-valued field. They carry the
//!   byte offset inside the value where splitting stopped.
//!
//! Range handling never fails; out-of-domain input is clamped instead.
//!
//! ## Examples
//!
//! ```rust
//! use quadlet_unit::{from_str, Error};
//!
//! let err = from_str("justtext").unwrap_err();
//! assert!(err.is_parse_error());
//! assert_eq!(err.line(), Some(1));
//! ```

use thiserror::Error;

/// Everything that can go wrong while reading unit files or splitting values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// IO error while loading or writing a file
    #[error("IO error: {0}")]
    Io(String),

    /// Input bytes were not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    Utf8(String),

    /// A line that is neither a comment, a group header nor a key/value pair
    #[error("File contains line {line}: \u{201c}{text}\u{201d} which is not a key-value pair, group, or comment")]
    InvalidLine { line: usize, text: String },

    /// A group header with an empty name or forbidden characters
    #[error("Invalid group name at line {line}: {name}")]
    InvalidGroupName { line: usize, name: String },

    /// A key that is empty, padded with spaces or has a malformed locale suffix
    #[error("Invalid key name at line {line}: {key}")]
    InvalidKeyName { line: usize, key: String },

    /// A key/value pair appeared before the first group header
    #[error("Key file does not start with a group (line {line})")]
    GroupNotFound { line: usize },

    /// A quote was opened but never closed
    #[error("Unterminated quote at offset {offset}")]
    UnterminatedQuote { offset: usize },

    /// A backslash sequence that is not a known escape
    #[error("Invalid escape sequence '\\{sequence}' at offset {offset}")]
    InvalidEscape { offset: usize, sequence: String },

    /// The input ended right after a backslash
    #[error("Trailing backslash at offset {offset}")]
    TrailingBackslash { offset: usize },
}

impl Error {
    /// Creates an I/O error from a message.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates an error for a line that is not a comment, header or entry.
    pub fn invalid_line(line: usize, text: &str) -> Self {
        Error::InvalidLine {
            line,
            text: text.to_string(),
        }
    }

    /// Creates an invalid group name error.
    pub fn invalid_group_name(line: usize, name: &str) -> Self {
        Error::InvalidGroupName {
            line,
            name: name.to_string(),
        }
    }

    /// Creates an invalid key name error.
    pub fn invalid_key_name(line: usize, key: &str) -> Self {
        Error::InvalidKeyName {
            line,
            key: key.to_string(),
        }
    }

    /// Creates an error for an entry before the first group header.
    pub fn group_not_found(line: usize) -> Self {
        Error::GroupNotFound { line }
    }

    /// Creates an unterminated quote error at byte `offset`.
    pub fn unterminated_quote(offset: usize) -> Self {
        Error::UnterminatedQuote { offset }
    }

    /// Creates an invalid escape error. `sequence` is the text after the
    /// backslash, truncated by the caller to something readable.
    pub fn invalid_escape(offset: usize, sequence: &str) -> Self {
        Error::InvalidEscape {
            offset,
            sequence: sequence.to_string(),
        }
    }

    /// Creates a trailing backslash error at byte `offset`.
    pub fn trailing_backslash(offset: usize) -> Self {
        Error::TrailingBackslash { offset }
    }

    /// Line number for parse errors, `None` for everything else.
    ///
    /// ```rust
    /// use quadlet_unit::Error;
    ///
    /// assert_eq!(Error::group_not_found(3).line(), Some(3));
    /// assert_eq!(Error::unterminated_quote(7).line(), None);
    /// ```
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::InvalidLine { line, .. }
            | Error::InvalidGroupName { line, .. }
            | Error::InvalidKeyName { line, .. }
            | Error::GroupNotFound { line } => Some(*line),
            _ => None,
        }
    }

    /// Returns `true` if this error rejects a whole unit file.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        self.line().is_some()
    }

    /// Returns `true` if this error came from splitting a single value.
    #[must_use]
    pub fn is_tokenize_error(&self) -> bool {
        matches!(
            self,
            Error::UnterminatedQuote { .. }
                | Error::InvalidEscape { .. }
                | Error::TrailingBackslash { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_line_message() {
        let err = Error::invalid_line(1, "justtext");
        let msg = err.to_string();
        assert!(msg.contains("line 1"));
        assert!(msg.contains("justtext"));
    }

    #[test]
    fn test_classification() {
        assert!(Error::invalid_key_name(2, " key").is_parse_error());
        assert!(!Error::invalid_key_name(2, " key").is_tokenize_error());
        assert!(Error::invalid_escape(4, "q").is_tokenize_error());
        assert!(Error::trailing_backslash(4).is_tokenize_error());
        assert!(!Error::io("gone").is_parse_error());
        assert!(!Error::io("gone").is_tokenize_error());
    }

    #[test]
    fn test_escape_message_shows_sequence() {
        let err = Error::invalid_escape(3, "q");
        assert_eq!(err.to_string(), "Invalid escape sequence '\\q' at offset 3");
    }
}
