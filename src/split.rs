//! Shell style word splitting.
//!
//! This is the grammar systemd uses for multi-valued settings such as
//! `Environment=` or `ExecStart=`: words are separated by runs of separator
//! characters, quotes group words, and backslashes escape. Every aspect is
//! controlled by [`SplitFlags`].
//!
//! ## Examples
//!
//! ```rust
//! use quadlet_unit::{split, SplitFlags};
//!
//! let words = split("FOO=1 'BAR=two words'", None, SplitFlags::UNQUOTE).unwrap();
//! assert_eq!(words, vec!["FOO=1", "BAR=two words"]);
//!
//! let words = split("a\\tb", None, SplitFlags::CUNESCAPE).unwrap();
//! assert_eq!(words, vec!["a\tb"]);
//!
//! assert!(split("'open", None, SplitFlags::UNQUOTE).is_err());
//! ```

use crate::escape::unescape_one;
use crate::options::{SplitFlags, WHITESPACE};
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Normal,
    InQuote(char),
    /// Just saw a backslash; remembers the quote it appeared in.
    Escape(Option<char>),
}

/// Lazy iterator over the words of a string.
///
/// Created by [`words`]. The iterator is `Clone`, so a saved copy restarts
/// the sequence from where it was taken. After an error it yields nothing.
#[derive(Clone, Debug)]
pub struct Words<'a> {
    input: &'a str,
    /// Byte offset of the unread input; `None` once exhausted.
    cursor: Option<usize>,
    separators: &'a str,
    flags: SplitFlags,
}

/// Returns a lazy iterator over the words of `input`.
///
/// `separators` defaults to space, tab, newline and carriage return.
pub fn words<'a>(input: &'a str, separators: Option<&'a str>, flags: SplitFlags) -> Words<'a> {
    let separators = match separators {
        Some(s) if !s.is_empty() => s,
        _ => WHITESPACE,
    };
    Words {
        input,
        cursor: Some(0),
        separators,
        flags,
    }
}

/// Splits `input` into words.
///
/// # Errors
///
/// Returns [`Error::UnterminatedQuote`], [`Error::InvalidEscape`] or
/// [`Error::TrailingBackslash`] when the input is malformed and `flags`
/// do not relax the problem.
pub fn split(input: &str, separators: Option<&str>, flags: SplitFlags) -> Result<Vec<String>> {
    words(input, separators, flags).collect()
}

impl<'a> Words<'a> {
    fn is_separator(&self, c: char) -> bool {
        self.separators.contains(c)
    }

    fn peek(&self, pos: usize) -> Option<char> {
        self.input[pos..].chars().next()
    }

    /// Input ran out: no more words after this one.
    fn terminate(&mut self, word: String) -> Option<String> {
        self.cursor = None;
        self.finish(word)
    }

    fn finish(&mut self, word: String) -> Option<String> {
        if word.is_empty() {
            self.cursor = None;
            return None;
        }
        Some(word)
    }

    fn next_word(&mut self) -> Result<Option<String>> {
        let Some(mut pos) = self.cursor else {
            return Ok(None);
        };
        let flags = self.flags;
        let mut word = String::new();

        loop {
            let Some(c) = self.peek(pos) else {
                return Ok(self.terminate(word));
            };
            if !self.is_separator(c) {
                break;
            }
            pos += c.len_utf8();
            if flags.contains(SplitFlags::DONT_COALESCE_SEPARATORS) {
                self.cursor = Some(pos);
                return Ok(Some(word));
            }
        }

        let mut state = State::Normal;
        loop {
            let next = self.peek(pos);
            match state {
                State::Escape(quote) => {
                    let Some(c) = next else {
                        if flags.contains(SplitFlags::UNESCAPE_RELAX)
                            && (quote.is_none() || flags.contains(SplitFlags::RELAX))
                        {
                            word.push('\\');
                            return Ok(self.terminate(word));
                        }
                        if flags.contains(SplitFlags::RELAX) {
                            return Ok(self.terminate(word));
                        }
                        return Err(Error::trailing_backslash(pos));
                    };

                    if flags.intersects(SplitFlags::CUNESCAPE | SplitFlags::UNESCAPE_SEPARATORS) {
                        let decoded = if flags.contains(SplitFlags::CUNESCAPE) {
                            unescape_one(&self.input[pos..])
                        } else {
                            None
                        };

                        if let Some((u, consumed)) = decoded {
                            word.push(u);
                            pos += consumed;
                        } else if flags.contains(SplitFlags::UNESCAPE_SEPARATORS)
                            && (self.is_separator(c) || c == '\\')
                        {
                            word.push(c);
                            pos += c.len_utf8();
                        } else if flags.contains(SplitFlags::UNESCAPE_RELAX) {
                            word.push('\\');
                            word.push(c);
                            pos += c.len_utf8();
                        } else {
                            let sequence: String = self.input[pos..].chars().take(9).collect();
                            return Err(Error::invalid_escape(pos, &sequence));
                        }
                    } else {
                        word.push(c);
                        pos += c.len_utf8();
                    }

                    state = quote.map_or(State::Normal, State::InQuote);
                }

                State::InQuote(quote) => {
                    let Some(c) = next else {
                        if flags.contains(SplitFlags::RELAX) {
                            return Ok(self.terminate(word));
                        }
                        return Err(Error::unterminated_quote(pos));
                    };
                    pos += c.len_utf8();

                    if c == quote {
                        state = State::Normal;
                        if !flags.contains(SplitFlags::UNQUOTE) {
                            word.push(c);
                        }
                    } else if c == '\\' && !flags.contains(SplitFlags::RETAIN_ESCAPE) {
                        state = State::Escape(Some(quote));
                    } else {
                        word.push(c);
                    }
                }

                State::Normal => {
                    let Some(c) = next else {
                        return Ok(self.terminate(word));
                    };

                    if (c == '\'' || c == '"')
                        && flags.intersects(SplitFlags::KEEP_QUOTE | SplitFlags::UNQUOTE)
                    {
                        pos += c.len_utf8();
                        state = State::InQuote(c);
                        if !flags.contains(SplitFlags::UNQUOTE) {
                            word.push(c);
                        }
                    } else if c == '\\' && !flags.contains(SplitFlags::RETAIN_ESCAPE) {
                        pos += c.len_utf8();
                        state = State::Escape(None);
                    } else if self.is_separator(c) {
                        if flags.contains(SplitFlags::DONT_COALESCE_SEPARATORS) {
                            if !flags.contains(SplitFlags::RETAIN_SEPARATORS) {
                                pos += c.len_utf8();
                            }
                            self.cursor = Some(pos);
                            return Ok(Some(word));
                        }

                        if !flags.contains(SplitFlags::RETAIN_SEPARATORS) {
                            loop {
                                match self.peek(pos) {
                                    None => return Ok(self.terminate(word)),
                                    Some(s) if self.is_separator(s) => pos += s.len_utf8(),
                                    Some(_) => break,
                                }
                            }
                        }
                        self.cursor = Some(pos);
                        return Ok(self.finish(word));
                    } else {
                        word.push(c);
                        pos += c.len_utf8();
                    }
                }
            }
        }
    }
}

impl<'a> Iterator for Words<'a> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_word() {
            Ok(Some(word)) => Some(Ok(word)),
            Ok(None) => None,
            Err(err) => {
                self.cursor = None;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_ok(input: &str, flags: SplitFlags) -> Vec<String> {
        split(input, None, flags).unwrap()
    }

    #[test]
    fn test_plain_words() {
        assert_eq!(split_ok("  a  b\tc\n", SplitFlags::empty()), vec!["a", "b", "c"]);
        assert!(split_ok("", SplitFlags::empty()).is_empty());
        assert!(split_ok(" \t ", SplitFlags::empty()).is_empty());
    }

    #[test]
    fn test_quotes_without_quote_flags_are_literal() {
        assert_eq!(split_ok("'a b'", SplitFlags::empty()), vec!["'a", "b'"]);
    }

    #[test]
    fn test_keep_quote() {
        assert_eq!(
            split_ok("x='a b' y", SplitFlags::KEEP_QUOTE),
            vec!["x='a b'", "y"]
        );
    }

    #[test]
    fn test_unquote() {
        assert_eq!(
            split_ok("x='a b' \"c d\"e", SplitFlags::UNQUOTE),
            vec!["x=a b", "c de"]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        let err = split("ok 'never closed", None, SplitFlags::UNQUOTE).unwrap_err();
        assert_eq!(err, Error::unterminated_quote(16));
        assert_eq!(
            split_ok("ok 'never closed", SplitFlags::UNQUOTE | SplitFlags::RELAX),
            vec!["ok", "never closed"]
        );
    }

    #[test]
    fn test_backslash_without_unescape_keeps_next_char() {
        assert_eq!(split_ok("a\\ b c", SplitFlags::empty()), vec!["a b", "c"]);
        assert_eq!(split_ok("a\\nb", SplitFlags::empty()), vec!["anb"]);
    }

    #[test]
    fn test_cunescape() {
        assert_eq!(
            split_ok("a\\nb \\x41\\102 \\u00e9", SplitFlags::CUNESCAPE),
            vec!["a\nb", "AB", "é"]
        );
    }

    #[test]
    fn test_cunescape_rejects_unknown() {
        let err = split("a\\qb", None, SplitFlags::CUNESCAPE).unwrap_err();
        assert_eq!(err, Error::invalid_escape(2, "qb"));
    }

    #[test]
    fn test_unescape_relax_keeps_unknown() {
        assert_eq!(
            split_ok("a\\qb", SplitFlags::CUNESCAPE | SplitFlags::UNESCAPE_RELAX),
            vec!["a\\qb"]
        );
    }

    #[test]
    fn test_unescape_separators() {
        let words = split("a\\:b:c", Some(":"), SplitFlags::UNESCAPE_SEPARATORS).unwrap();
        assert_eq!(words, vec!["a:b", "c"]);
        let err = split("a\\qb", Some(":"), SplitFlags::UNESCAPE_SEPARATORS).unwrap_err();
        assert!(err.is_tokenize_error());
    }

    #[test]
    fn test_trailing_backslash() {
        assert_eq!(
            split("abc\\", None, SplitFlags::empty()).unwrap_err(),
            Error::trailing_backslash(4)
        );
        assert_eq!(split_ok("abc\\", SplitFlags::RELAX), vec!["abc"]);
        assert_eq!(split_ok("abc\\", SplitFlags::UNESCAPE_RELAX), vec!["abc\\"]);
    }

    #[test]
    fn test_trailing_backslash_in_quote_needs_relax() {
        let flags = SplitFlags::UNQUOTE | SplitFlags::UNESCAPE_RELAX;
        assert!(split("'abc\\", None, flags).is_err());
        assert_eq!(
            split_ok("'abc\\", flags | SplitFlags::RELAX),
            vec!["abc\\"]
        );
    }

    #[test]
    fn test_retain_escape() {
        assert_eq!(
            split_ok("a\\ b", SplitFlags::RETAIN_ESCAPE),
            vec!["a\\", "b"]
        );
    }

    #[test]
    fn test_dont_coalesce() {
        let words = split(",a,,b,", Some(","), SplitFlags::DONT_COALESCE_SEPARATORS).unwrap();
        assert_eq!(words, vec!["", "a", "", "b"]);
    }

    #[test]
    fn test_retain_separators_leaves_cursor_on_separator() {
        let mut it = words("a  b", None, SplitFlags::RETAIN_SEPARATORS);
        assert_eq!(it.next(), Some(Ok("a".to_string())));
        assert_eq!(it.cursor, Some(1));
        assert_eq!(it.next(), Some(Ok("b".to_string())));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_retain_separators_without_coalescing() {
        let flags = SplitFlags::DONT_COALESCE_SEPARATORS | SplitFlags::RETAIN_SEPARATORS;
        assert_eq!(split("a,b", Some(","), flags).unwrap(), vec!["a", "", "b"]);
    }

    #[test]
    fn test_empty_quoted_word_ends_sequence() {
        assert_eq!(split_ok("a '' b", SplitFlags::UNQUOTE), vec!["a"]);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let start = words("one two three", None, SplitFlags::empty());
        let first: Vec<_> = start.clone().map(|w| w.unwrap()).collect();
        let second: Vec<_> = start.map(|w| w.unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let mut it = words("a \\q b", None, SplitFlags::CUNESCAPE);
        assert_eq!(it.next(), Some(Ok("a".to_string())));
        assert!(matches!(it.next(), Some(Err(_))));
        assert_eq!(it.next(), None);
    }
}
