//! Unit file parser.
//!
//! The input is read one logical line at a time. A logical line is a physical
//! line, extended across following lines while a `key=value` line ends in an
//! unescaped backslash. Each logical line is then classified, in order, as a
//! comment, a group header or a key/value pair; anything else rejects the
//! whole file.
//!
//! Comments are held back until it is known where they belong: comments
//! directly before a header become that group's leading comments, comments
//! before a key stay in the current group's line list, and comments at the
//! end of the file are appended to the last group.

use crate::unit::{is_valid_group_name, is_valid_key_name, UnitFile, UnitLine};
use crate::{Error, Result};

/// Parses unit file text into a document.
pub(crate) fn parse(text: &str) -> Result<UnitFile> {
    let mut parser = Parser::new();
    parser.parse(text)?;
    Ok(parser.finish())
}

struct Parser {
    unit: UnitFile,
    current_group: Option<String>,
    pending_comments: Vec<String>,
}

impl Parser {
    fn new() -> Self {
        Parser {
            unit: UnitFile::new(),
            current_group: None,
            pending_comments: Vec::new(),
        }
    }

    fn parse(&mut self, text: &str) -> Result<()> {
        let mut start = 0;
        let mut line_nr = 1;

        while start < text.len() {
            let mut end = line_end(text, start);
            let mut physical_lines = 1;

            if line_is_key_value_pair(&text[start..end]) {
                while end < text.len() && ends_with_continuation(&text[start..end]) {
                    end = line_end(text, end + 1);
                    physical_lines += 1;
                }
            }

            self.parse_line(&text[start..end], line_nr)?;

            line_nr += physical_lines;
            start = end + 1;
        }

        Ok(())
    }

    fn parse_line(&mut self, line: &str, line_nr: usize) -> Result<()> {
        if line_is_comment(line) {
            self.pending_comments.push(line.to_string());
            Ok(())
        } else if let Some(name) = group_header_name(line) {
            self.parse_group(name, line_nr)
        } else if line_is_key_value_pair(line) {
            self.parse_key_value_pair(line, line_nr)
        } else {
            Err(Error::invalid_line(line_nr, line))
        }
    }

    fn parse_group(&mut self, name: &str, line_nr: usize) -> Result<()> {
        if !is_valid_group_name(name) {
            return Err(Error::invalid_group_name(line_nr, name));
        }

        // The printer puts one blank line between groups, so drop it here.
        // Nothing is printed before the first group, so all leading blank
        // lines go there.
        let blanks = if self.unit.is_empty() {
            self.pending_comments
                .iter()
                .take_while(|c| c.is_empty())
                .count()
        } else {
            usize::from(self.pending_comments.first().is_some_and(String::is_empty))
        };
        self.pending_comments.drain(..blanks);

        let comments = std::mem::take(&mut self.pending_comments);
        self.unit.ensure_group(name).comments.extend(comments);
        self.current_group = Some(name.to_string());
        Ok(())
    }

    fn parse_key_value_pair(&mut self, line: &str, line_nr: usize) -> Result<()> {
        let Some(group) = self.current_group.as_deref() else {
            return Err(Error::group_not_found(line_nr));
        };

        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::invalid_line(line_nr, line));
        };

        let key = key.trim_end_matches(|c: char| c.is_ascii_whitespace());
        if !is_valid_key_name(key) {
            return Err(Error::invalid_key_name(line_nr, key));
        }
        let value = value.trim_start_matches(|c: char| c.is_ascii_whitespace());

        let pending = std::mem::take(&mut self.pending_comments);
        let lines = &mut self.unit.ensure_group(group).lines;
        lines.extend(pending.into_iter().map(UnitLine::Comment));
        lines.push(UnitLine::entry(key, value));
        Ok(())
    }

    fn finish(mut self) -> UnitFile {
        // Trailing comments go to the group printed last, which is not the
        // current one if that was reopened. Without any group they are lost.
        let pending = std::mem::take(&mut self.pending_comments);
        if let Some((_, group)) = self.unit.groups.last_mut() {
            group
                .lines
                .extend(pending.into_iter().map(UnitLine::Comment));
        }
        self.unit
    }
}

/// Byte offset of the newline ending the line that starts at `start`, or the
/// end of `text`.
fn line_end(text: &str, start: usize) -> usize {
    text[start..].find('\n').map_or(text.len(), |i| start + i)
}

fn ends_with_continuation(line: &str) -> bool {
    let backslashes = line.bytes().rev().take_while(|&b| b == b'\\').count();
    backslashes % 2 == 1
}

fn line_is_comment(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with(';')
}

/// The name inside `[name]`, if `line` is a header. Spaces and tabs may
/// follow the closing bracket.
fn group_header_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let trailing = &rest[close + 1..];
    if trailing.chars().all(|c| c == ' ' || c == '\t') {
        Some(&rest[..close])
    } else {
        None
    }
}

fn line_is_key_value_pair(line: &str) -> bool {
    line.find('=').is_some_and(|i| i > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_classification() {
        assert!(line_is_comment(""));
        assert!(line_is_comment("# hi"));
        assert!(line_is_comment("; hi"));
        assert!(!line_is_comment(" # indented"));

        assert_eq!(group_header_name("[Unit]"), Some("Unit"));
        assert_eq!(group_header_name("[Unit] \t"), Some("Unit"));
        assert_eq!(group_header_name("[]"), Some(""));
        assert_eq!(group_header_name("[Unit] x"), None);
        assert_eq!(group_header_name("[Unit"), None);

        assert!(line_is_key_value_pair("a=b"));
        assert!(line_is_key_value_pair("a="));
        assert!(!line_is_key_value_pair("=b"));
        assert!(!line_is_key_value_pair("ab"));
    }

    #[test]
    fn test_continuation_needs_odd_backslashes() {
        assert!(ends_with_continuation("a=b\\"));
        assert!(!ends_with_continuation("a=b\\\\"));
        assert!(ends_with_continuation("a=b\\\\\\"));
        assert!(!ends_with_continuation("a=b"));
    }

    #[test]
    fn test_continuation_is_kept_raw() {
        let unit = parse("[S]\nExec=a \\\n  b \\\n c\nNext=1\n").unwrap();
        assert_eq!(unit.lookup_last_raw("S", "Exec"), Some("a \\\n  b \\\n c"));
        assert_eq!(unit.lookup_last_raw("S", "Next"), Some("1"));
    }

    #[test]
    fn test_continuation_swallows_comments() {
        let unit = parse("[S]\nExec=a \\\n# not a comment\n").unwrap();
        assert_eq!(
            unit.lookup("S", "Exec").as_deref(),
            Some("a  # not a comment")
        );
    }

    #[test]
    fn test_error_line_counts_physical_lines() {
        let err = parse("[S]\nA=1 \\\n2\nbroken\n").unwrap_err();
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn test_value_leading_whitespace_skipped() {
        let unit = parse("[S]\nKey  =   spaced value\n").unwrap();
        assert_eq!(unit.lookup_last_raw("S", "Key"), Some("spaced value"));
    }

    #[test]
    fn test_reopened_group_accumulates() {
        let unit = parse("[A]\nX=1\n[B]\nY=2\n[A]\nX=3\n").unwrap();
        assert_eq!(unit.groups().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(unit.lookup_all("A", "X"), vec!["1", "3"]);
    }

    #[test]
    fn test_comments_without_group_are_dropped() {
        let unit = parse("# only a comment\n\n").unwrap();
        assert!(unit.is_empty());
    }

    #[test]
    fn test_leading_comments() {
        let unit = parse("# head\n[A]\nX=1\n\n# about B\n[B]\n").unwrap();
        assert_eq!(unit.group("A").unwrap().comments(), ["# head"]);
        assert_eq!(unit.group("B").unwrap().comments(), ["# about B"]);
        assert!(unit.group("A").unwrap().lines().iter().all(|l| !l.is_comment()));
    }

    #[test]
    fn test_blank_lines_before_first_group_dropped() {
        let unit = parse("\n# intro\n[A]\n\n[B]\n").unwrap();
        assert_eq!(unit.group("A").unwrap().comments(), ["# intro"]);
        assert!(unit.group("B").unwrap().comments().is_empty());
        assert_eq!(unit.to_string(), "# intro\n[A]\n\n[B]\n");

        assert_eq!(parse("\n[A]\nX=1\n").unwrap().to_string(), "[A]\nX=1\n");
        assert_eq!(parse("\n\n\n[A]\nX=1\n").unwrap().to_string(), "[A]\nX=1\n");
    }

    #[test]
    fn test_blank_lines_after_leading_comment_kept() {
        let text = "# intro\n\n[A]\nX=1\n";
        let unit = parse(text).unwrap();
        assert_eq!(unit.group("A").unwrap().comments(), ["# intro", ""]);
        assert_eq!(unit.to_string(), text);
    }

    #[test]
    fn test_trailing_comments_stay_in_group() {
        let unit = parse("[A]\nX=1\n# tail\n").unwrap();
        let lines = unit.group("A").unwrap().lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], UnitLine::Comment("# tail".to_string()));
    }

    #[test]
    fn test_trailing_comments_after_reopened_group() {
        let unit = parse("[A]\nX=1\n[B]\n[A]\nY=2\n# tail\n").unwrap();
        assert_eq!(unit.group("B").unwrap().lines().len(), 1);
        assert_eq!(unit.to_string(), "[A]\nX=1\nY=2\n\n[B]\n# tail\n");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse("justtext"),
            Err(Error::InvalidLine { line: 1, .. })
        ));
        assert!(matches!(
            parse("A=1\n"),
            Err(Error::GroupNotFound { line: 1 })
        ));
        assert!(matches!(
            parse("[]\n"),
            Err(Error::InvalidGroupName { line: 1, .. })
        ));
        assert!(matches!(
            parse("[S]\n leadingspace=1\n"),
            Err(Error::InvalidKeyName { line: 2, .. })
        ));
        assert!(matches!(
            parse("[S]\n   \n"),
            Err(Error::InvalidLine { line: 2, .. })
        ));
    }
}
