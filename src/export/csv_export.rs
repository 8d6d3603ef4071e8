//! CSV Export

use std::path::Path;

use crate::domain::HistoryEntry;

/// Write call history to a CSV file, one row per call.
pub fn write_history(path: &Path, entries: &[HistoryEntry]) -> anyhow::Result<usize> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "id",
        "timestamp",
        "call_type",
        "caller",
        "target",
        "value",
        "gas_limit",
        "input_data",
        "status",
        "gas_used",
        "return_data",
        "deployed_address",
        "error",
    ])?;

    for entry in entries {
        wtr.write_record([
            entry.id.to_string(),
            entry.timestamp.to_rfc3339(),
            entry.params.call_type.to_string(),
            entry.params.caller.clone(),
            entry.params.target.clone(),
            entry.params.value.clone(),
            entry.params.gas_limit.clone(),
            entry.params.input_data.clone(),
            entry.result.status_label().to_string(),
            entry.result.gas_used.to_string(),
            entry.result.return_data.to_string(),
            entry
                .result
                .deployed_address
                .map(|address| address.to_string())
                .unwrap_or_default(),
            entry.result.error.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(entries.len())
}
