//! Parse a unit file and print it back in canonical form.
//!
//! Run with: cargo run --example roundtrip [path]
//!
//! Without a path the unit file is read from stdin.

use quadlet_unit::{from_reader, to_writer, UnitFile};
use std::error::Error;
use std::io;

fn main() -> Result<(), Box<dyn Error>> {
    let unit = match std::env::args().nth(1) {
        Some(path) => UnitFile::from_path(path)?,
        None => from_reader(io::stdin().lock())?,
    };

    eprintln!("groups:");
    for group in unit.groups() {
        eprintln!("  [{}] keys: {}", group, unit.keys(group).join(", "));
    }

    to_writer(io::stdout().lock(), &unit)?;
    Ok(())
}
