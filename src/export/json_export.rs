//! JSON Export

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::HistoryEntry;

/// Write call history as a pretty-printed JSON array.
pub fn write_history(path: &Path, entries: &[HistoryEntry]) -> anyhow::Result<usize> {
    let json = serde_json::to_string_pretty(entries)?;

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;

    Ok(entries.len())
}
