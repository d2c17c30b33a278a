//! Show the `--uidmap` arguments for a container.
//!
//! Run with: cargo run --example idmap [owner]
//!
//! The host id pool comes from /etc/subuid for `owner` (default "quadlet"),
//! or the built-in fallback pool if the owner has no entry.

use quadlet_unit::subid::{DEFAULT_REMAP_USER, SUBUID_PATH};
use quadlet_unit::{unit_file, PodmanCommand, SubIds};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let owner = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_REMAP_USER.to_string());

    let subuids = SubIds::load_or_empty(SUBUID_PATH);
    let default_pool = subuids.remap_pool(&owner);

    let container = unit_file! {
        "Container" => {
            "Image" => "registry.fedoraproject.org/fedora:latest",
            "RemapUsers" => "yes",
            "RemapUidStart" => 1000,
        }
    };

    let pool = container.lookup_ranges("Container", "RemapUidRanges", Some(&subuids), Some(&default_pool));
    let threshold = container.lookup_u32("Container", "RemapUidStart", 1);
    println!("pool for {owner}: {pool}");

    let mut podman = PodmanCommand::new(["run"]);
    podman.add_id_maps("--uidmap", 0, 0, threshold, &pool);
    if let Some(image) = container.lookup("Container", "Image") {
        podman.add(image);
    }

    println!("{}", podman.to_exec());
    Ok(())
}
