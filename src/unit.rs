//! The unit file document model.
//!
//! A [`UnitFile`] is an ordered list of named groups. Each [`UnitGroup`]
//! remembers the comments that preceded its header and an ordered list of
//! [`UnitLine`]s, which are either comments or `key=value` entries. Nothing is
//! normalised away: keys may repeat, comments are kept verbatim, and values
//! keep their backslash-newline continuations until they are looked up.
//!
//! ## Examples
//!
//! ```rust
//! use quadlet_unit::UnitFile;
//!
//! let mut unit: UnitFile = "[Container]\nImage=fedora\nExec=sleep \\\n  60\n".parse().unwrap();
//!
//! assert_eq!(unit.lookup("Container", "Image").as_deref(), Some("fedora"));
//! assert_eq!(unit.lookup("Container", "Exec").as_deref(), Some("sleep    60"));
//!
//! unit.rename_group("Container", "Service");
//! unit.add("Service", "Restart", "always");
//! assert_eq!(unit.to_string(), "[Service]\nImage=fedora\nExec=sleep \\\n  60\nRestart=always\n");
//! ```

use crate::escape::escape_words;
use crate::options::SplitOptions;
use crate::ranges::Ranges;
use crate::subid::SubIds;
use crate::Result;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One line inside a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitLine {
    /// A comment or blank line, kept verbatim.
    Comment(String),
    /// A `key=value` entry. The value is the raw text, continuations included.
    Entry { key: String, value: String },
}

impl UnitLine {
    /// Creates a `key=value` entry.
    pub fn entry(key: &str, value: &str) -> Self {
        UnitLine::Entry {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// The key of an entry, `None` for comments.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            UnitLine::Entry { key, .. } => Some(key),
            UnitLine::Comment(_) => None,
        }
    }

    /// The raw value of an entry, or the text of a comment.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            UnitLine::Entry { value, .. } => value,
            UnitLine::Comment(text) => text,
        }
    }

    #[must_use]
    pub fn is_comment(&self) -> bool {
        matches!(self, UnitLine::Comment(_))
    }

    fn is_key(&self, key: &str) -> bool {
        self.key() == Some(key)
    }
}

/// A named section of a unit file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitGroup {
    pub(crate) comments: Vec<String>,
    pub(crate) lines: Vec<UnitLine>,
}

impl UnitGroup {
    /// Comments printed before the `[name]` header.
    #[must_use]
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Entries and comments after the header, in file order.
    #[must_use]
    pub fn lines(&self) -> &[UnitLine] {
        &self.lines
    }

    /// Iterates over `(key, raw value)` pairs, skipping comments.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            UnitLine::Entry { key, value } => Some((key.as_str(), value.as_str())),
            UnitLine::Comment(_) => None,
        })
    }

    fn find_last_mut(&mut self, key: &str) -> Option<&mut UnitLine> {
        self.lines.iter_mut().rev().find(|line| line.is_key(key))
    }

    fn find_last(&self, key: &str) -> Option<&UnitLine> {
        self.lines.iter().rev().find(|line| line.is_key(key))
    }

    pub(crate) fn append(&mut self, other: UnitGroup) {
        self.comments.extend(other.comments);
        self.lines.extend(other.lines);
    }
}

/// A parsed unit file.
///
/// Groups are kept in file order and looked up by their case-sensitive name.
/// `Clone` produces an independent deep copy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitFile {
    pub(crate) groups: IndexMap<String, UnitGroup>,
    path: Option<PathBuf>,
}

impl UnitFile {
    /// Creates an empty document.
    ///
    /// ```rust
    /// use quadlet_unit::UnitFile;
    ///
    /// let unit = UnitFile::new();
    /// assert!(unit.is_empty());
    /// assert_eq!(unit.to_string(), "");
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses unit file text.
    ///
    /// # Errors
    ///
    /// Returns a parse error naming the first offending line.
    pub fn parse(text: &str) -> Result<Self> {
        crate::parser::parse(text)
    }

    /// Reads and parses the file at `path`, remembering the path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read, or
    /// a parse error.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading unit file {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let mut unit = Self::parse(&text)?;
        unit.path = Some(path.to_path_buf());
        Ok(unit)
    }

    /// The file this document was loaded from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records the file this document belongs to. Printing ignores it.
    pub fn set_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.path = Some(path.into());
    }

    /// Prints the document back to unit file text.
    #[must_use]
    pub fn print(&self) -> String {
        self.to_string()
    }

    /// Returns `true` if the document has no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group names in document order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    #[must_use]
    pub fn group(&self, name: &str) -> Option<&UnitGroup> {
        self.groups.get(name)
    }

    #[must_use]
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    #[must_use]
    pub fn has_key(&self, group: &str, key: &str) -> bool {
        self.group(group)
            .is_some_and(|g| g.lines.iter().any(|line| line.is_key(key)))
    }

    /// Distinct keys of `group`, in order of first appearance.
    ///
    /// ```rust
    /// use quadlet_unit::UnitFile;
    ///
    /// let unit = UnitFile::parse("[Unit]\nA=1\nB=2\nA=3\n").unwrap();
    /// assert_eq!(unit.keys("Unit"), vec!["A", "B"]);
    /// assert!(unit.keys("Missing").is_empty());
    /// ```
    #[must_use]
    pub fn keys(&self, group: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        if let Some(g) = self.group(group) {
            for (key, _) in g.entries() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// The raw value of the last occurrence of `key`.
    #[must_use]
    pub fn lookup_last_raw(&self, group: &str, key: &str) -> Option<&str> {
        self.group(group)?.find_last(key).map(UnitLine::value)
    }

    /// The last value of `key` with continuations collapsed.
    #[must_use]
    pub fn lookup_last(&self, group: &str, key: &str) -> Option<String> {
        self.lookup_last_raw(group, key)
            .map(apply_line_continuation)
    }

    /// Like [`lookup_last`](Self::lookup_last), with trailing whitespace
    /// removed.
    #[must_use]
    pub fn lookup(&self, group: &str, key: &str) -> Option<String> {
        self.lookup_last(group, key).map(|mut value| {
            let len = value.trim_end_matches(|c: char| c.is_ascii_whitespace()).len();
            value.truncate(len);
            value
        })
    }

    /// Every raw value of `key`. An empty value discards the values before it.
    ///
    /// ```rust
    /// use quadlet_unit::UnitFile;
    ///
    /// let unit = UnitFile::parse("[S]\nK=a\nK=\nK=b\nK=c\n").unwrap();
    /// assert_eq!(unit.lookup_all_raw("S", "K"), vec!["b", "c"]);
    /// ```
    #[must_use]
    pub fn lookup_all_raw(&self, group: &str, key: &str) -> Vec<&str> {
        let mut res = Vec::new();
        if let Some(g) = self.group(group) {
            for line in g.lines.iter().filter(|line| line.is_key(key)) {
                if line.value().is_empty() {
                    res.clear();
                } else {
                    res.push(line.value());
                }
            }
        }
        res
    }

    /// Every value of `key` with continuations collapsed, honouring resets.
    #[must_use]
    pub fn lookup_all(&self, group: &str, key: &str) -> Vec<String> {
        self.lookup_all_raw(group, key)
            .into_iter()
            .map(apply_line_continuation)
            .collect()
    }

    /// Reads a boolean. `1`, `yes`, `true` and `on` (any case) are true, any
    /// other value is false. A missing or empty value yields `default`.
    ///
    /// ```rust
    /// use quadlet_unit::UnitFile;
    ///
    /// let unit = UnitFile::parse("[S]\nA=Yes\nB=nope\nC=\n").unwrap();
    /// assert!(unit.lookup_bool("S", "A", false));
    /// assert!(!unit.lookup_bool("S", "B", true));
    /// assert!(unit.lookup_bool("S", "C", true));
    /// assert!(unit.lookup_bool("S", "D", true));
    /// ```
    #[must_use]
    pub fn lookup_bool(&self, group: &str, key: &str, default: bool) -> bool {
        match self.lookup(group, key) {
            Some(value) if !value.is_empty() => ["1", "yes", "true", "on"]
                .iter()
                .any(|t| value.eq_ignore_ascii_case(t)),
            _ => default,
        }
    }

    /// Reads the leading base-10 integer of the value. A missing value, or
    /// one without a numeric prefix, yields `default`.
    ///
    /// ```rust
    /// use quadlet_unit::UnitFile;
    ///
    /// let unit = UnitFile::parse("[S]\nA= -42kb\nB=abc\n").unwrap();
    /// assert_eq!(unit.lookup_int("S", "A", 0), -42);
    /// assert_eq!(unit.lookup_int("S", "B", 7), 7);
    /// ```
    #[must_use]
    pub fn lookup_int(&self, group: &str, key: &str, default: i64) -> i64 {
        self.lookup(group, key)
            .and_then(|value| parse_int_prefix(&value))
            .unwrap_or(default)
    }

    /// [`lookup_int`](Self::lookup_int) clamped to the `u32` domain.
    #[must_use]
    pub fn lookup_u32(&self, group: &str, key: &str, default: u32) -> u32 {
        let value = self.lookup_int(group, key, i64::from(default));
        value.clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Splits the last value of `key` into command line words.
    ///
    /// A value that fails to split is logged and treated as absent.
    #[must_use]
    pub fn lookup_last_args(&self, group: &str, key: &str) -> Option<Vec<String>> {
        let value = self.lookup_last(group, key)?;
        split_logged(&SplitOptions::args(), group, key, &value)
    }

    /// Splits every value of `key` into command line words and concatenates
    /// them. Values that fail to split are logged and skipped.
    ///
    /// ```rust
    /// use quadlet_unit::UnitFile;
    ///
    /// let unit = UnitFile::parse("[C]\nPodmanArgs=--a 'b c'\nPodmanArgs=--d\n").unwrap();
    /// assert_eq!(unit.lookup_all_args("C", "PodmanArgs"), vec!["--a", "b c", "--d"]);
    /// ```
    #[must_use]
    pub fn lookup_all_args(&self, group: &str, key: &str) -> Vec<String> {
        let options = SplitOptions::args();
        self.lookup_all(group, key)
            .iter()
            .filter_map(|value| split_logged(&options, group, key, value))
            .flatten()
            .collect()
    }

    /// Collects `KEY=VALUE` words from every value of `key`. Later
    /// assignments override earlier ones; words without `=` are logged and
    /// skipped.
    ///
    /// ```rust
    /// use quadlet_unit::UnitFile;
    ///
    /// let unit = UnitFile::parse("[C]\nEnvironment=A=1 \"B=two words\"\nEnvironment=A=3\n").unwrap();
    /// let env = unit.lookup_all_key_val("C", "Environment");
    /// assert_eq!(env.get("A").map(String::as_str), Some("3"));
    /// assert_eq!(env.get("B").map(String::as_str), Some("two words"));
    /// ```
    #[must_use]
    pub fn lookup_all_key_val(&self, group: &str, key: &str) -> BTreeMap<String, String> {
        let options = SplitOptions::key_vals();
        let mut res = BTreeMap::new();
        for value in self.lookup_all(group, key) {
            let Some(assigns) = split_logged(&options, group, key, &value) else {
                continue;
            };
            for assign in assigns {
                match assign.split_once('=') {
                    Some((k, v)) => {
                        res.insert(k.to_string(), v.to_string());
                    }
                    None => log::warn!("Invalid key=value assignment '{}'", assign),
                }
            }
        }
        res
    }

    /// Reads an id range setting.
    ///
    /// A value starting with a digit is a range list. Any other value names
    /// a user whose sub-id ranges are taken from `subids`; unknown names give
    /// an empty set. An empty value is an empty set and a missing key yields
    /// a copy of `default`.
    ///
    /// ```rust
    /// use quadlet_unit::{SubIds, UnitFile};
    ///
    /// let subids = SubIds::parse("alice:100000:65536\n");
    /// let unit = UnitFile::parse("[C]\nA=0-9,20\nB=alice\n").unwrap();
    ///
    /// assert_eq!(unit.lookup_ranges("C", "A", None, None).len(), 2);
    /// assert_eq!(unit.lookup_ranges("C", "B", Some(&subids), None).length(), 65536);
    /// assert!(unit.lookup_ranges("C", "Missing", None, None).is_empty());
    /// ```
    #[must_use]
    pub fn lookup_ranges(
        &self,
        group: &str,
        key: &str,
        subids: Option<&SubIds>,
        default: Option<&Ranges>,
    ) -> Ranges {
        let Some(value) = self.lookup(group, key) else {
            return default.cloned().unwrap_or_default();
        };

        match value.chars().next() {
            None => Ranges::new_empty(),
            Some(c) if c.is_ascii_digit() => Ranges::parse(&value),
            Some(_) => subids
                .and_then(|ids| ids.ranges_for(&value))
                .unwrap_or_default(),
        }
    }

    /// Replaces the last occurrence of `key`, or appends it if absent.
    /// Creates the group if needed.
    pub fn set(&mut self, group: &str, key: &str, value: &str) {
        let g = self.ensure_group(group);
        match g.find_last_mut(key) {
            Some(UnitLine::Entry { value: old, .. }) => {
                *old = value.to_string();
            }
            _ => g.lines.push(UnitLine::entry(key, value)),
        }
    }

    /// [`set`](Self::set) for several pairs in order.
    pub fn set_many<I, K, V>(&mut self, group: &str, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            self.set(group, key.as_ref(), value.as_ref());
        }
    }

    /// Appends `key=value`, creating the group if needed.
    pub fn add(&mut self, group: &str, key: &str, value: &str) {
        self.ensure_group(group)
            .lines
            .push(UnitLine::entry(key, value));
    }

    /// Appends `words` as one escaped command line value.
    ///
    /// ```rust
    /// use quadlet_unit::UnitFile;
    ///
    /// let mut unit = UnitFile::new();
    /// unit.add_cmdline("Service", "ExecStart", ["/usr/bin/podman", "run", "a b"]);
    /// assert_eq!(
    ///     unit.lookup("Service", "ExecStart").as_deref(),
    ///     Some("/usr/bin/podman run \"a b\"")
    /// );
    /// ```
    pub fn add_cmdline<I, S>(&mut self, group: &str, key: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add(group, key, &escape_words(words));
    }

    /// Removes every occurrence of `key` from `group`.
    pub fn unset(&mut self, group: &str, key: &str) {
        if let Some(g) = self.groups.get_mut(group) {
            g.lines.retain(|line| !line.is_key(key));
        }
    }

    /// Adds an empty group at the end, unless it already exists.
    pub fn add_group(&mut self, name: &str) {
        self.ensure_group(name);
    }

    /// Removes a group with all its comments and entries.
    pub fn remove_group(&mut self, name: &str) {
        self.groups.shift_remove(name);
    }

    /// Renames a group.
    ///
    /// If `to` is free the group keeps its position. Otherwise its comments
    /// and lines are appended to the existing `to` group and `from` is
    /// removed.
    ///
    /// ```rust
    /// use quadlet_unit::UnitFile;
    ///
    /// let mut unit = UnitFile::parse("[A]\nX=1\n[B]\nY=2\n").unwrap();
    /// unit.rename_group("A", "B");
    /// assert_eq!(unit.to_string(), "[B]\nY=2\nX=1\n");
    /// ```
    pub fn rename_group(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let Some(index) = self.groups.get_index_of(from) else {
            return;
        };

        if self.groups.contains_key(to) {
            if let Some((_, source)) = self.groups.shift_remove_index(index) {
                self.ensure_group(to).append(source);
            }
        } else if let Some((_, group)) = self.groups.shift_remove_index(index) {
            self.groups.shift_insert(index, to.to_string(), group);
        }
    }

    /// Appends every group of `other`, creating missing groups at the end.
    pub fn merge(&mut self, other: &UnitFile) {
        for (name, group) in &other.groups {
            self.ensure_group(name).append(group.clone());
        }
    }

    pub(crate) fn ensure_group(&mut self, name: &str) -> &mut UnitGroup {
        self.groups.entry(name.to_string()).or_default()
    }
}

fn split_logged(options: &SplitOptions, group: &str, key: &str, value: &str) -> Option<Vec<String>> {
    match options.split(value) {
        Ok(words) => Some(words),
        Err(err) => {
            log::warn!("Ignoring invalid {}.{} value '{}': {}", group, key, value, err);
            None
        }
    }
}

impl FromStr for UnitFile {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for UnitFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::printer::write_unit(f, self)
    }
}

/// Replaces every backslash-newline with a single space.
///
/// ```rust
/// use quadlet_unit::unit::apply_line_continuation;
///
/// assert_eq!(apply_line_continuation("a \\\nb"), "a  b");
/// ```
#[must_use]
pub fn apply_line_continuation(raw: &str) -> String {
    raw.replace("\\\n", " ")
}

/// Leading base-10 integer of `s`: optional leading whitespace, an optional
/// sign, then digits. Saturates on overflow. `None` without digits.
pub(crate) fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut seen = false;
    let mut value: i64 = 0;
    for d in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        let d = i64::from(d - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(d)
        } else {
            value.saturating_mul(10).saturating_add(d)
        };
    }
    seen.then_some(value)
}

/// Returns `true` for a non-empty group name without `[`, `]` or control
/// characters.
#[must_use]
pub fn is_valid_group_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c == '[' || c == ']' || c.is_ascii_control())
}

/// Returns `true` for a valid key name.
///
/// Keys must be non-empty, must not contain `=`, `[` or `]`, and must not
/// begin or end with a space. A locale suffix such as `Name[de_DE.UTF-8]`
/// is accepted.
///
/// ```rust
/// use quadlet_unit::unit::is_valid_key_name;
///
/// assert!(is_valid_key_name("Key[en_US]"));
/// assert!(is_valid_key_name("Key with spaces"));
/// assert!(!is_valid_key_name(" leadingspace"));
/// assert!(!is_valid_key_name("Key [en]"));
/// assert!(!is_valid_key_name("Key[en]x"));
/// ```
#[must_use]
pub fn is_valid_key_name(name: &str) -> bool {
    let base_len = name.find(&['=', '[', ']'][..]).unwrap_or(name.len());
    let (base, rest) = name.split_at(base_len);

    if base.is_empty() || base.starts_with(' ') || base.ends_with(' ') {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    let Some(locale) = rest.strip_prefix('[') else {
        return false;
    };
    let tag_len = locale
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '@')))
        .unwrap_or(locale.len());
    &locale[tag_len..] == "]"
}
