//! Position-file protocol: a single decimal line holding the number of
//! input bytes consumed so far, enabling resumption across runs.

use std::fs::OpenOptions;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

/// Read the stored byte offset. A missing, empty, or unparseable file is
/// treated as offset 0.
#[must_use]
pub fn read_pos(path: &Path) -> u64 {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|text| text.trim().parse().ok())
        .unwrap_or(0)
}

/// Rewrite the position file from offset 0, truncating any leftover tail.
pub fn write_pos(path: &Path, read_bytes: u64) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", read_bytes)
}
