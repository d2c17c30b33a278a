//! Sets of disjoint `u32` intervals.
//!
//! [`Ranges`] keeps its intervals sorted and non-overlapping. Adding merges
//! with every interval the new one overlaps or touches; removing trims or
//! splits intervals but never re-merges what it leaves behind.
//!
//! The value `u32::MAX` is a sentinel and is never covered, so every interval
//! satisfies `start + length <= u32::MAX`.
//!
//! ## Examples
//!
//! ```rust
//! use quadlet_unit::Ranges;
//!
//! let mut ranges = Ranges::new(10, 10);
//! ranges.add(20, 5);
//! assert_eq!(ranges.len(), 1);
//! assert_eq!(ranges.length(), 15);
//!
//! ranges.remove(12, 2);
//! assert_eq!(ranges.to_string(), "10-11,14-24");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One interval `[start, start + length)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: u32,
    pub length: u32,
}

impl Range {
    #[must_use]
    pub const fn new(start: u32, length: u32) -> Self {
        Range { start, length }
    }

    /// One past the last covered value.
    #[must_use]
    pub fn end(&self) -> u64 {
        u64::from(self.start) + u64::from(self.length)
    }

    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        value >= self.start && u64::from(value) < self.end()
    }
}

/// A sorted set of disjoint intervals.
///
/// Serializes as a list of intervals. Deserializing adds them one by one, so
/// unsorted or overlapping input is normalised.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Range>", into = "Vec<Range>")]
pub struct Ranges {
    ranges: Vec<Range>,
}

impl Ranges {
    /// Creates an empty set.
    #[must_use]
    pub fn new_empty() -> Self {
        Ranges { ranges: Vec::new() }
    }

    /// Creates a set holding a single interval, clamped to the domain.
    ///
    /// ```rust
    /// use quadlet_unit::Ranges;
    ///
    /// let ranges = Ranges::new(17, 42);
    /// assert_eq!(ranges.as_slice().len(), 1);
    /// assert_eq!(ranges.as_slice()[0].start, 17);
    /// assert_eq!(ranges.as_slice()[0].length, 42);
    /// ```
    #[must_use]
    pub fn new(start: u32, length: u32) -> Self {
        let mut ranges = Self::new_empty();
        ranges.add(start, length);
        ranges
    }

    /// Parses a comma separated list of `start` or `start-end` tokens.
    ///
    /// `end` is inclusive. A token without an end (`5` or `5-`) runs to the
    /// top of the domain. Values are clamped to `0..=u32::MAX`; unparsable
    /// numbers read as `0`. Empty tokens and tokens with `end < start` are
    /// skipped.
    ///
    /// ```rust
    /// use quadlet_unit::Ranges;
    ///
    /// let ranges = Ranges::parse("100-199,300-300");
    /// assert_eq!(ranges.length(), 101);
    ///
    /// let open = Ranges::parse("4294967290");
    /// assert_eq!(open.length(), 5);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut res = Self::new_empty();
        for token in text.split(',').filter(|t| !t.is_empty()) {
            let (start_s, end_s) = match token.split_once('-') {
                Some((start, end)) => (start, end),
                None => (token, ""),
            };

            let start = clamp_u32(parse_prefix(start_s));
            let end = if end_s.is_empty() {
                u32::MAX
            } else {
                clamp_u32(parse_prefix(end_s))
            };

            if end >= start {
                let length = (u64::from(end) - u64::from(start) + 1).min(u64::from(u32::MAX));
                res.add(start, length as u32);
            }
        }
        res
    }

    /// Number of disjoint intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns `true` if no value is covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of covered values.
    #[must_use]
    pub fn length(&self) -> u32 {
        self.ranges.iter().map(|r| r.length).sum()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Range] {
        &self.ranges
    }

    /// Iterates over the intervals in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, Range> {
        self.ranges.iter()
    }

    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        let idx = self.ranges.partition_point(|r| r.end() <= u64::from(value));
        self.ranges.get(idx).is_some_and(|r| r.contains(value))
    }

    /// Adds `[start, start + length)`, merging every interval it overlaps or
    /// touches into one.
    pub fn add(&mut self, start: u32, length: u32) {
        if length == 0 || start == u32::MAX {
            return;
        }
        let length = length.min(u32::MAX - start);

        let mut new_start = u64::from(start);
        let mut new_end = new_start + u64::from(length);

        let first = self.ranges.partition_point(|r| r.end() < new_start);
        let last = self
            .ranges
            .partition_point(|r| u64::from(r.start) <= new_end);

        if first < last {
            new_start = new_start.min(u64::from(self.ranges[first].start));
            new_end = new_end.max(self.ranges[last - 1].end());
        }

        let merged = Range::new(new_start as u32, (new_end - new_start) as u32);
        self.ranges.splice(first..last, std::iter::once(merged));
    }

    /// Removes `[start, start + length)` from every interval it overlaps.
    ///
    /// Intervals are trimmed, split in two, or dropped when emptied.
    /// Neighbours left touching are not merged.
    pub fn remove(&mut self, start: u32, length: u32) {
        if length == 0 {
            return;
        }
        let cut_start = u64::from(start);
        let cut_end = cut_start + u64::from(length);

        let first = self.ranges.partition_point(|r| r.end() <= cut_start);
        let last = self
            .ranges
            .partition_point(|r| u64::from(r.start) < cut_end);
        if first >= last {
            return;
        }

        let head = self.ranges[first];
        let tail = self.ranges[last - 1];
        let mut keep = Vec::with_capacity(2);
        if u64::from(head.start) < cut_start {
            keep.push(Range::new(head.start, (cut_start - u64::from(head.start)) as u32));
        }
        if tail.end() > cut_end {
            keep.push(Range::new(cut_end as u32, (tail.end() - cut_end) as u32));
        }

        self.ranges.splice(first..last, keep);
    }

    /// Adds every interval of `other`.
    pub fn merge(&mut self, other: &Ranges) {
        for r in &other.ranges {
            self.add(r.start, r.length);
        }
    }
}

/// Leading base-10 integer of `s`, the way `strtoll` reads it. Saturates on
/// overflow; no digits reads as `0`.
fn parse_prefix(s: &str) -> i64 {
    crate::unit::parse_int_prefix(s).unwrap_or(0)
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

impl<'a> IntoIterator for &'a Ranges {
    type Item = &'a Range;
    type IntoIter = std::slice::Iter<'a, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl FromIterator<Range> for Ranges {
    fn from_iter<T: IntoIterator<Item = Range>>(iter: T) -> Self {
        let mut ranges = Ranges::new_empty();
        for r in iter {
            ranges.add(r.start, r.length);
        }
        ranges
    }
}

impl From<Vec<Range>> for Ranges {
    fn from(ranges: Vec<Range>) -> Self {
        ranges.into_iter().collect()
    }
}

impl From<Ranges> for Vec<Range> {
    fn from(ranges: Ranges) -> Self {
        ranges.ranges
    }
}

impl FromStr for Ranges {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Ranges::parse(s))
    }
}

impl fmt::Display for Ranges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.ranges.iter().enumerate() {
            if i != 0 {
                f.write_str(",")?;
            }
            write!(f, "{}-{}", r.start, r.end() - 1)?;
        }
        Ok(())
    }
}
