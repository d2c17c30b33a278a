//! User and group namespace mappings.
//!
//! [`allocate_id_map`] decides how every id inside a container maps to a
//! host id:
//!
//! 1. the chosen container id maps to the chosen host id,
//! 2. ids below the identity threshold map to themselves,
//! 3. everything else is filled, lowest first, from a pool of host ids.
//!
//! No host id is handed out twice and no container id is mapped twice.
//!
//! ## Examples
//!
//! ```rust
//! use quadlet_unit::{allocate_id_map, IdMapping, Ranges};
//!
//! let pool = Ranges::new(100_000, 65_536);
//! let maps = allocate_id_map(0, 1000, 1, &pool);
//!
//! assert_eq!(maps[0], IdMapping::new(0, 1000, 1));
//! assert_eq!(maps[1], IdMapping::new(1, 100_000, 65_536));
//! assert_eq!(maps[1].to_string(), "1:100000:65536");
//! ```

use crate::ranges::Ranges;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `length` consecutive container ids starting at `container_start`, mapped
/// onto host ids starting at `host_start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdMapping {
    pub container_start: u32,
    pub host_start: u32,
    pub length: u32,
}

impl IdMapping {
    #[must_use]
    pub const fn new(container_start: u32, host_start: u32, length: u32) -> Self {
        IdMapping {
            container_start,
            host_start,
            length,
        }
    }
}

/// Formats as `container:host:length`, the `--uidmap` argument syntax.
impl fmt::Display for IdMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.container_start, self.host_start, self.length)
    }
}

/// Computes the mappings for one id kind (uids or gids).
///
/// `container_id` always maps to `host_id`. Container ids in
/// `0..identity_threshold` other than `container_id` and `host_id` map to
/// themselves. All remaining container ids are mapped in ascending order to
/// the ids in `available_host_ids`, until the pool runs dry.
///
/// The pool is copied; the caller's value is left untouched.
#[must_use]
pub fn allocate_id_map(
    container_id: u32,
    host_id: u32,
    identity_threshold: u32,
    available_host_ids: &Ranges,
) -> Vec<IdMapping> {
    let mut maps = Vec::new();
    let mut pool = available_host_ids.clone();

    let mut unmapped = Ranges::new(0, identity_threshold);
    // Overlaps `unmapped` so that ids removed from it get backfilled.
    let mut mapped = Ranges::new(0, u32::MAX);

    push_mapping(&mut maps, container_id, host_id, 1);

    mapped.remove(container_id, 1);
    unmapped.remove(container_id, 1);

    // A host id can only be used once.
    unmapped.remove(host_id, 1);
    pool.remove(host_id, 1);

    for r in &unmapped {
        push_mapping(&mut maps, r.start, r.start, r.length);
        mapped.remove(r.start, r.length);
        pool.remove(r.start, r.length);
    }

    for r in &mapped {
        let mut container_start = r.start;
        let mut remaining = r.length;

        while remaining > 0 {
            let Some(host) = pool.as_slice().first().copied() else {
                return maps;
            };
            let length = host.length.min(remaining);

            push_mapping(&mut maps, container_start, host.start, length);
            pool.remove(host.start, length);
            container_start += length;
            remaining -= length;
        }
    }

    maps
}

fn push_mapping(maps: &mut Vec<IdMapping>, container_start: u32, host_start: u32, length: u32) {
    if length != 0 {
        maps.push(IdMapping::new(container_start, host_start, length));
    }
}
