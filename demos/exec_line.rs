//! Split an `ExecStart=` style value into words and escape it again.
//!
//! Run with: cargo run --example exec_line -- 'sh -c "echo hi; exit 0"'

use quadlet_unit::{escape_words, SplitOptions};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let line = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/usr/bin/podman run --env 'A=b c' image sh -c \"echo hi; exit 0\"".to_string());

    let words = SplitOptions::args().split(&line)?;
    for (i, word) in words.iter().enumerate() {
        println!("{i:>2}: {word:?}");
    }

    let escaped = escape_words(&words);
    println!("escaped: {escaped}");

    let back = SplitOptions::args().split(&escaped)?;
    assert_eq!(words, back);
    println!("✓ Round-trip successful");

    Ok(())
}
