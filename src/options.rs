//! Configuration for word splitting.
//!
//! This module provides the knobs that control [`split`](crate::split):
//!
//! - [`SplitFlags`]: independent behaviour switches, freely combined
//! - [`SplitOptions`]: separators plus flags, with presets for the common
//!   unit file use cases
//!
//! ## Examples
//!
//! ```rust
//! use quadlet_unit::{SplitFlags, SplitOptions};
//!
//! // Exec= style arguments: quotes group words and are removed
//! let words = SplitOptions::args().split("run 'hello world'").unwrap();
//! assert_eq!(words, vec!["run", "hello world"]);
//!
//! // Comma separated list where every comma counts
//! let options = SplitOptions::new()
//!     .with_separators(",")
//!     .with_flags(SplitFlags::DONT_COALESCE_SEPARATORS);
//! assert_eq!(options.split("a,,b").unwrap(), vec!["a", "", "b"]);
//! ```

use crate::split::{words, Words};
use crate::Result;

/// Separators used when none are given: space, tab, newline and carriage return.
pub const WHITESPACE: &str = " \t\n\r";

bitflags::bitflags! {
    /// Behaviour switches for word splitting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SplitFlags: u16 {
        /// Allow unbalanced quotes and eat up a trailing backslash.
        const RELAX = 1 << 0;
        /// Decode C style escapes such as `\n` or `\x41`.
        const CUNESCAPE = 1 << 1;
        /// Keep unknown escapes and a trailing backslash verbatim.
        const UNESCAPE_RELAX = 1 << 2;
        /// Decode a backslash followed by a separator (or a backslash).
        const UNESCAPE_SEPARATORS = 1 << 3;
        /// Ignore separators inside `"..."` and `'...'`, keeping the quotes.
        const KEEP_QUOTE = 1 << 4;
        /// Ignore separators inside `"..."` and `'...'`, removing the quotes.
        const UNQUOTE = 1 << 5;
        /// Every separator is a boundary; adjacent separators yield empty words.
        const DONT_COALESCE_SEPARATORS = 1 << 6;
        /// Treat `\` as an ordinary character.
        const RETAIN_ESCAPE = 1 << 7;
        /// Leave trailing separators in the input after a word.
        ///
        /// Combined with `DONT_COALESCE_SEPARATORS` the retained separator
        /// starts the next word, so every boundary yields an extra empty
        /// word: `a,b` splits into `a`, `""`, `b`.
        const RETAIN_SEPARATORS = 1 << 8;
    }
}

/// Separators and flags for a split.
///
/// # Examples
///
/// ```rust
/// use quadlet_unit::{SplitFlags, SplitOptions};
///
/// let options = SplitOptions::new();
/// assert_eq!(options.separators, " \t\n\r");
/// assert!(options.flags.is_empty());
///
/// let options = SplitOptions::key_vals();
/// assert!(options.flags.contains(SplitFlags::CUNESCAPE));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitOptions {
    pub separators: String,
    pub flags: SplitFlags,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            separators: WHITESPACE.to_string(),
            flags: SplitFlags::empty(),
        }
    }
}

impl SplitOptions {
    /// Whitespace separators, no flags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for command lines such as `Exec=` and `PodmanArgs=`.
    #[must_use]
    pub fn args() -> Self {
        SplitOptions {
            flags: SplitFlags::RELAX | SplitFlags::UNQUOTE,
            ..Default::default()
        }
    }

    /// Options for `KEY=VALUE` lists such as `Environment=` and `Label=`.
    #[must_use]
    pub fn key_vals() -> Self {
        SplitOptions {
            flags: SplitFlags::RELAX | SplitFlags::UNQUOTE | SplitFlags::CUNESCAPE,
            ..Default::default()
        }
    }

    /// Replaces the separator set. An empty string falls back to whitespace.
    #[must_use]
    pub fn with_separators(mut self, separators: &str) -> Self {
        self.separators = if separators.is_empty() {
            WHITESPACE.to_string()
        } else {
            separators.to_string()
        };
        self
    }

    /// Replaces the flag set.
    #[must_use]
    pub fn with_flags(mut self, flags: SplitFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Lazily iterates over the words of `input`.
    pub fn words<'a>(&'a self, input: &'a str) -> Words<'a> {
        words(input, Some(self.separators.as_str()), self.flags)
    }

    /// Splits `input` into words.
    ///
    /// # Errors
    ///
    /// Returns a tokenize error for an unterminated quote or a bad escape
    /// that the flags do not relax.
    pub fn split(&self, input: &str) -> Result<Vec<String>> {
        self.words(input).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(
            SplitOptions::args().flags,
            SplitFlags::RELAX | SplitFlags::UNQUOTE
        );
        assert_eq!(SplitOptions::key_vals().separators, WHITESPACE);
    }

    #[test]
    fn test_empty_separators_fall_back() {
        let options = SplitOptions::new().with_separators("");
        assert_eq!(options.separators, WHITESPACE);
    }

    #[test]
    fn test_builder_split() {
        let options = SplitOptions::new().with_separators(":");
        assert_eq!(options.split("a::b").unwrap(), vec!["a", "b"]);
    }
}
