//! C style escapes in both directions.
//!
//! [`escape_words`] turns a list of arguments into one command line string
//! that systemd's `ExecStart=` parser (and [`split`](crate::split)) reads back
//! as the same list. [`unescape_one`] decodes a single escape sequence and is
//! used by the splitter when [`SplitFlags::CUNESCAPE`](crate::SplitFlags) is set.

/// Decodes the escape sequence at the start of `s`, which is the text right
/// after a backslash.
///
/// Returns the decoded character and the number of bytes consumed from `s`,
/// or `None` if the sequence is not a valid escape. NUL is never produced.
///
/// ```rust
/// use quadlet_unit::escape::unescape_one;
///
/// assert_eq!(unescape_one("n rest"), Some(('\n', 1)));
/// assert_eq!(unescape_one("x41"), Some(('A', 3)));
/// assert_eq!(unescape_one("101"), Some(('A', 3)));
/// assert_eq!(unescape_one("u00e9"), Some(('é', 5)));
/// assert_eq!(unescape_one("q"), None);
/// ```
#[must_use]
pub fn unescape_one(s: &str) -> Option<(char, usize)> {
    let bytes = s.as_bytes();
    let simple = match *bytes.first()? {
        b'a' => Some('\u{7}'),
        b'b' => Some('\u{8}'),
        b'f' => Some('\u{c}'),
        b'n' => Some('\n'),
        b'r' => Some('\r'),
        b't' => Some('\t'),
        b'v' => Some('\u{b}'),
        b'\\' => Some('\\'),
        b'"' => Some('"'),
        b'\'' => Some('\''),
        b's' => Some(' '),
        _ => None,
    };
    if let Some(c) = simple {
        return Some((c, 1));
    }

    match bytes[0] {
        b'x' => {
            let value = hex_value(bytes.get(1..3)?)?;
            non_nul(value).map(|c| (c, 3))
        }
        b'u' => {
            let value = hex_value(bytes.get(1..5)?)?;
            non_nul(value).map(|c| (c, 5))
        }
        b'U' => {
            let value = hex_value(bytes.get(1..9)?)?;
            non_nul(value).map(|c| (c, 9))
        }
        b'0'..=b'7' => {
            let digits = bytes.get(0..3)?;
            let mut value = 0u32;
            for &d in digits {
                if !(b'0'..=b'7').contains(&d) {
                    return None;
                }
                value = (value << 3) | u32::from(d - b'0');
            }
            if value > 255 {
                return None;
            }
            non_nul(value).map(|c| (c, 3))
        }
        _ => None,
    }
}

fn hex_value(digits: &[u8]) -> Option<u32> {
    digits.iter().try_fold(0u32, |acc, &d| {
        let v = (d as char).to_digit(16)?;
        Some((acc << 4) | v)
    })
}

fn non_nul(value: u32) -> Option<char> {
    if value == 0 {
        return None;
    }
    char::from_u32(value)
}

fn char_needs_escape(c: char) -> bool {
    if !c.is_ascii() {
        return false;
    }

    c.is_ascii_control()
        || c.is_ascii_whitespace()
        || c == '"'
        || c == '\''
        || c == '\\'
        || c == ';'
}

fn word_needs_escape(word: &str) -> bool {
    word.chars().any(char_needs_escape)
}

fn push_escaped_word(out: &mut String, word: &str) {
    out.push('"');
    for c in word.chars() {
        if !char_needs_escape(c) {
            out.push(c);
            continue;
        }
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push('\t'),
            '\u{c}' => out.push_str("\\f"),
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            '"' => out.push_str("\\\""),
            ' ' | '\'' => out.push(c),
            _ => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
        }
    }
    out.push('"');
}

/// Joins `words` with single spaces, quoting and escaping the words that
/// need it.
///
/// ```rust
/// use quadlet_unit::escape_words;
///
/// assert_eq!(escape_words(["podman", "run"]), "podman run");
/// assert_eq!(escape_words(["echo", "a b;c"]), "echo \"a b\\;c\"");
/// ```
pub fn escape_words<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut escaped = String::new();
    for (i, word) in words.into_iter().enumerate() {
        let word = word.as_ref();
        if i != 0 {
            escaped.push(' ');
        }
        if word_needs_escape(word) {
            push_escaped_word(&mut escaped, word);
        } else {
            escaped.push_str(word);
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_escapes() {
        assert_eq!(unescape_one("a"), Some(('\u{7}', 1)));
        assert_eq!(unescape_one("s"), Some((' ', 1)));
        assert_eq!(unescape_one("\\"), Some(('\\', 1)));
        assert_eq!(unescape_one("'"), Some(('\'', 1)));
    }

    #[test]
    fn test_numeric_escapes() {
        assert_eq!(unescape_one("x7e"), Some(('~', 3)));
        assert_eq!(unescape_one("xff"), Some(('\u{ff}', 3)));
        assert_eq!(unescape_one("U0001F600"), Some(('\u{1F600}', 9)));
        assert_eq!(unescape_one("377"), Some(('\u{ff}', 3)));
    }

    #[test]
    fn test_rejected_escapes() {
        assert_eq!(unescape_one(""), None);
        assert_eq!(unescape_one("x0"), None);
        assert_eq!(unescape_one("x00"), None);
        assert_eq!(unescape_one("xzz"), None);
        assert_eq!(unescape_one("u0000"), None);
        assert_eq!(unescape_one("uD800"), None);
        assert_eq!(unescape_one("U00110000"), None);
        assert_eq!(unescape_one("000"), None);
        assert_eq!(unescape_one("400"), None);
        assert_eq!(unescape_one("18"), None);
        assert_eq!(unescape_one("q"), None);
    }

    #[test]
    fn test_escape_plain_words() {
        assert_eq!(escape_words(Vec::<String>::new()), "");
        assert_eq!(escape_words(["--name=systemd-%N"]), "--name=systemd-%N");
    }

    #[test]
    fn test_escape_map() {
        assert_eq!(escape_words(["a\nb"]), "\"a\\nb\"");
        assert_eq!(escape_words(["a\rb"]), "\"a\\rb\"");
        assert_eq!(escape_words(["a\tb"]), "\"a\tb\"");
        assert_eq!(escape_words(["a\u{c}b"]), "\"a\\fb\"");
        assert_eq!(escape_words(["a\\b"]), "\"a\\\\b\"");
        assert_eq!(escape_words(["it's"]), "\"it's\"");
        assert_eq!(escape_words(["say \"hi\""]), "\"say \\\"hi\\\"\"");
        assert_eq!(escape_words(["bell\u{7}"]), "\"bell\\x07\"");
        assert_eq!(escape_words(["del\u{7f}"]), "\"del\\x7f\"");
        assert_eq!(escape_words(["esc\u{1b}[0m"]), "\"esc\\x1b[0m\"");
    }

    #[test]
    fn test_unicode_is_not_escaped() {
        assert_eq!(escape_words(["héllo"]), "héllo");
        assert_eq!(escape_words(["日本 語"]), "\"日本 語\"");
    }
}
