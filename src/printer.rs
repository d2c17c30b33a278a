//! Unit file printer.
//!
//! Output is deterministic: groups in document order separated by exactly
//! one blank line, each group's leading comments, its `[name]` header, then
//! its lines verbatim. Printing a parsed document and parsing the result
//! again yields the same text.

use crate::unit::{UnitFile, UnitGroup, UnitLine};
use std::fmt::{self, Write};

/// Writes `unit` as unit file text.
pub(crate) fn write_unit<W: Write>(out: &mut W, unit: &UnitFile) -> fmt::Result {
    for (i, (name, group)) in unit.groups.iter().enumerate() {
        if i != 0 {
            out.write_char('\n')?;
        }
        write_group(out, name, group)?;
    }
    Ok(())
}

fn write_group<W: Write>(out: &mut W, name: &str, group: &UnitGroup) -> fmt::Result {
    for comment in &group.comments {
        writeln!(out, "{comment}")?;
    }
    writeln!(out, "[{name}]")?;
    for line in &group.lines {
        write_line(out, line)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, line: &UnitLine) -> fmt::Result {
    match line {
        UnitLine::Comment(text) => writeln!(out, "{text}"),
        UnitLine::Entry { key, value } => writeln!(out, "{key}={value}"),
    }
}
