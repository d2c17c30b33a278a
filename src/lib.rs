//! # quadlet_unit
//!
//! The engine beneath a generator that turns declarative container and
//! volume descriptions into systemd service units.
//!
//! ## What is in here?
//!
//! - **Unit files**: a round-trip preserving parser, model and printer for
//!   the INI-like systemd unit format ([`UnitFile`])
//! - **Word splitting**: the shell style tokenizer systemd uses for
//!   multi-valued settings ([`split`], [`SplitOptions`]) and the matching
//!   escaper for generated command lines ([`escape_words`])
//! - **Id ranges**: interval sets over `u32` ([`Ranges`]), a sub-id database
//!   reader ([`SubIds`]) and the namespace mapping allocator
//!   ([`allocate_id_map`])
//! - **Command lines**: a small builder for the runtime invocation
//!   ([`PodmanCommand`])
//!
//! Deciding which runtime flags a given setting produces is left to the
//! caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use quadlet_unit::{from_str, PodmanCommand, SubIds, UnitFile};
//!
//! let container: UnitFile = from_str(
//!     "[Container]\n\
//!      Image=docker.io/library/nginx\n\
//!      Environment=PORT=8080 \"GREETING=hello world\"\n\
//!      RemapUsers=yes\n",
//! )
//! .unwrap();
//!
//! let mut podman = PodmanCommand::new(["run", "--rm"]);
//! podman.add_env(&container.lookup_all_key_val("Container", "Environment"));
//!
//! if container.lookup_bool("Container", "RemapUsers", false) {
//!     let pool = SubIds::new().remap_pool("quadlet");
//!     podman.add_id_maps("--uidmap", 0, 0, 1, &pool);
//! }
//! if let Some(image) = container.lookup("Container", "Image") {
//!     podman.add(image);
//! }
//!
//! let mut service = container.clone();
//! service.rename_group("Container", "X-Container");
//! service.add("Service", "ExecStart", &podman.to_exec());
//!
//! let text = service.to_string();
//! assert!(text.contains("[X-Container]\n"));
//! assert!(text.contains("--env \"GREETING=hello world\" --env PORT=8080"));
//! assert!(text.contains("--uidmap 1:1879048192:165536"));
//! ```
//!
//! ## Round trips
//!
//! Printing a parsed file keeps every key, value, comment and group in
//! order. The only normalisation is that groups are separated by exactly one
//! blank line, so printing and parsing again is stable:
//!
//! ```rust
//! use quadlet_unit::UnitFile;
//!
//! let text = "# Generated\n[Unit]\nDescription=demo\n\n\n[Service]\nExecStart=/bin/true\n";
//! let once = UnitFile::parse(text).unwrap().to_string();
//! let twice = UnitFile::parse(&once).unwrap().to_string();
//! assert_eq!(once, twice);
//! ```
//!
//! ## Errors
//!
//! Parsing a unit file either succeeds or fails with the number of the first
//! bad line. Splitting a value fails on its own, without affecting the rest
//! of the document. See [`Error`].
//!
//! ## Demos
//!
//! The `demos/` directory holds small runnable programs:
//!
//! - **`roundtrip.rs`** - parse a unit file from stdin and print it back
//! - **`idmap.rs`** - show the `--uidmap` arguments for a sub-id pool
//! - **`exec_line.rs`** - split and re-escape an `ExecStart=` value
//!
//! Run any demo with: `cargo run --example <name>`

pub mod cmdline;
pub mod error;
pub mod escape;
pub mod idmap;
pub mod macros;
pub mod options;
mod parser;
mod printer;
pub mod ranges;
pub mod split;
pub mod subid;
pub mod unit;

pub use cmdline::PodmanCommand;
pub use error::{Error, Result};
pub use escape::escape_words;
pub use idmap::{allocate_id_map, IdMapping};
pub use options::{SplitFlags, SplitOptions};
pub use ranges::{Range, Ranges};
pub use split::{split, words, Words};
pub use subid::SubIds;
pub use unit::{UnitFile, UnitGroup, UnitLine};

use std::io;

/// Parses a unit file from a string.
///
/// # Examples
///
/// ```rust
/// use quadlet_unit::from_str;
///
/// let unit = from_str("[Unit]\nDescription=demo\n").unwrap();
/// assert_eq!(unit.lookup("Unit", "Description").as_deref(), Some("demo"));
/// ```
///
/// # Errors
///
/// Returns a parse error carrying the line number of the first line that is
/// not a comment, group header or key/value pair.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(s: &str) -> Result<UnitFile> {
    UnitFile::parse(s)
}

/// Parses a unit file from UTF-8 bytes.
///
/// # Examples
///
/// ```rust
/// use quadlet_unit::from_slice;
///
/// let unit = from_slice(b"[Unit]\nDescription=demo\n").unwrap();
/// assert!(unit.has_group("Unit"));
///
/// assert!(from_slice(b"[Unit]\nA=\xff\n").is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::Utf8`] if the bytes are not valid UTF-8, or a parse
/// error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(v: &[u8]) -> Result<UnitFile> {
    let s = std::str::from_utf8(v).map_err(|e| Error::Utf8(e.to_string()))?;
    from_str(s)
}

/// Parses a unit file from an I/O stream.
///
/// # Examples
///
/// ```rust
/// use quadlet_unit::from_reader;
/// use std::io::Cursor;
///
/// let unit = from_reader(Cursor::new(b"[Volume]\nUser=root\n")).unwrap();
/// assert_eq!(unit.lookup("Volume", "User").as_deref(), Some("root"));
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, the input is not UTF-8, or it does not
/// parse.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(mut reader: R) -> Result<UnitFile>
where
    R: io::Read,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Prints a unit file to a string.
///
/// # Examples
///
/// ```rust
/// use quadlet_unit::{to_string, UnitFile};
///
/// let mut unit = UnitFile::new();
/// unit.add("Install", "WantedBy", "default.target");
/// assert_eq!(to_string(&unit), "[Install]\nWantedBy=default.target\n");
/// ```
#[must_use]
pub fn to_string(unit: &UnitFile) -> String {
    unit.to_string()
}

/// Prints a unit file to a writer.
///
/// # Examples
///
/// ```rust
/// use quadlet_unit::{to_writer, unit_file};
///
/// let unit = unit_file! { "Unit" => { "Description" => "demo" } };
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &unit).unwrap();
/// assert_eq!(buffer, b"[Unit]\nDescription=demo\n");
/// ```
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(mut writer: W, unit: &UnitFile) -> Result<()>
where
    W: io::Write,
{
    writer
        .write_all(to_string(unit).as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_print_round_trip() {
        let text = "[Unit]\nDescription=test\n\n[Service]\nExecStart=/bin/true\n";
        let unit = from_str(text).unwrap();
        assert_eq!(to_string(&unit), text);
    }

    #[test]
    fn test_from_slice_rejects_invalid_utf8() {
        let err = from_slice(&[0x5b, 0xff, 0x5d]).unwrap_err();
        assert!(matches!(err, Error::Utf8(_)));
    }

    #[test]
    fn test_from_reader_matches_from_str() {
        let text = "[A]\nB=c\n";
        let a = from_reader(text.as_bytes()).unwrap();
        let b = from_str(text).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_to_writer() {
        let unit = from_str("[A]\nB=c\n").unwrap();
        let mut out = Vec::new();
        to_writer(&mut out, &unit).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[A]\nB=c\n");
    }
}
