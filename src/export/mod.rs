//! Export Module
//!
//! Writes call history to JSON and CSV files under `<data dir>/exports/`.

mod csv_export;
mod json_export;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;

use crate::domain::HistoryEntry;

/// Timestamped filename, e.g. `history_2024-05-01-120000.json`.
fn generate_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{prefix}_{timestamp}.{extension}")
}

/// Export `entries` into `dir`, returning the written paths.
pub fn export_history(dir: &Path, entries: &[HistoryEntry]) -> anyhow::Result<Vec<PathBuf>> {
    if entries.is_empty() {
        anyhow::bail!("No history to export");
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("create export directory {}", dir.display()))?;

    let json_path = dir.join(generate_filename("history", "json"));
    json_export::write_history(&json_path, entries)
        .with_context(|| format!("write {}", json_path.display()))?;

    let csv_path = dir.join(generate_filename("history", "csv"));
    csv_export::write_history(&csv_path, entries)
        .with_context(|| format!("write {}", csv_path.display()))?;

    tracing::info!(count = entries.len(), dir = %dir.display(), "history exported");
    Ok(vec![json_path, csv_path])
}
