//! Subordinate id databases (`/etc/subuid` and `/etc/subgid`).
//!
//! Each line has the form `owner:start:count` and grants `owner` the host ids
//! `start..start + count`. [`SubIds`] holds one parsed file. It is loaded
//! once and then passed to whoever needs it.
//!
//! ## Examples
//!
//! ```rust
//! use quadlet_unit::SubIds;
//!
//! let subuids = SubIds::parse("alice:100000:65536\nbob:200000:65536\nalice:300000:10\n");
//!
//! let alice = subuids.ranges_for("alice").unwrap();
//! assert_eq!(alice.len(), 2);
//! assert_eq!(alice.length(), 65546);
//!
//! assert!(subuids.ranges_for("carol").is_none());
//! assert_eq!(subuids.remap_pool("carol").to_string(), "1879048192-1879213727");
//! ```

use crate::ranges::Ranges;
use crate::unit::parse_int_prefix;
use crate::Result;
use indexmap::IndexMap;
use std::path::Path;

/// Where subordinate user ids are configured.
pub const SUBUID_PATH: &str = "/etc/subuid";

/// Where subordinate group ids are configured.
pub const SUBGID_PATH: &str = "/etc/subgid";

/// Owner whose sub-ids are used for remapping when nothing else is asked for.
pub const DEFAULT_REMAP_USER: &str = "quadlet";

/// First id of the pool used when [`DEFAULT_REMAP_USER`] has no entry.
pub const FALLBACK_REMAP_START: u32 = 1_879_048_192;

/// Size of the fallback pool.
pub const FALLBACK_REMAP_LENGTH: u32 = 165_536;

/// A parsed sub-id file, keyed by owner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubIds {
    owners: IndexMap<String, Ranges>,
}

impl SubIds {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses sub-id file text.
    ///
    /// Lines that do not have exactly three `:` separated fields, or whose
    /// start or count is zero, are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut subids = Self::new();
        for line in text.lines() {
            let mut parts = line.splitn(3, ':');
            let (Some(owner), Some(start), Some(count)) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };

            let start = clamp_id(start);
            let count = clamp_id(count);
            if start == 0 || count == 0 {
                continue;
            }

            subids
                .owners
                .entry(owner.to_string())
                .or_default()
                .add(start, count);
        }
        subids
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Like [`from_path`](Self::from_path), but a missing or unreadable file
    /// is an empty database.
    #[must_use]
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(subids) => subids,
            Err(err) => {
                log::debug!("no sub-ids from {}: {}", path.display(), err);
                Self::new()
            }
        }
    }

    /// Every id range granted to `owner`, or `None` if there is none.
    #[must_use]
    pub fn ranges_for(&self, owner: &str) -> Option<Ranges> {
        self.owners.get(owner).filter(|r| !r.is_empty()).cloned()
    }

    /// The host id pool used to remap containers for `owner`.
    ///
    /// Falls back to a fixed pool at the top of the 31 bit range when
    /// `owner` has no sub-ids.
    #[must_use]
    pub fn remap_pool(&self, owner: &str) -> Ranges {
        self.ranges_for(owner)
            .unwrap_or_else(|| Ranges::new(FALLBACK_REMAP_START, FALLBACK_REMAP_LENGTH))
    }

    /// Owners in file order.
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.owners.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

fn clamp_id(field: &str) -> u32 {
    parse_int_prefix(field)
        .unwrap_or(0)
        .clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_bad_lines() {
        let subids = SubIds::parse("\n# comment\nalice\nbob:0:100\ncarol:100:0\ndave:10:20\n");
        assert_eq!(subids.owners().collect::<Vec<_>>(), vec!["dave"]);
        assert_eq!(subids.ranges_for("dave"), Some(Ranges::new(10, 20)));
    }

    #[test]
    fn test_owner_prefix_does_not_match() {
        let subids = SubIds::parse("alice2:10:20\n");
        assert!(subids.ranges_for("alice").is_none());
    }

    #[test]
    fn test_extra_colons_read_as_prefix() {
        let subids = SubIds::parse("alice:10:20:junk\n");
        assert_eq!(subids.ranges_for("alice"), Some(Ranges::new(10, 20)));
    }

    #[test]
    fn test_remap_pool_prefers_owner() {
        let subids = SubIds::parse("quadlet:500000:1000\n");
        assert_eq!(subids.remap_pool(DEFAULT_REMAP_USER), Ranges::new(500_000, 1000));
        assert_eq!(
            SubIds::new().remap_pool(DEFAULT_REMAP_USER),
            Ranges::new(FALLBACK_REMAP_START, FALLBACK_REMAP_LENGTH)
        );
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let subids = SubIds::load_or_empty("/nonexistent/quadlet-unit/subuid");
        assert!(subids.is_empty());
        assert!(SubIds::from_path("/nonexistent/quadlet-unit/subuid").is_err());
    }
}
