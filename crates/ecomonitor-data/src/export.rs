//! CSV export of usage records.
//!
//! One row per record, resolved through resident → dwelling. Rows are joined
//! with `\n` and the last row has no terminator. Fields that contain a comma,
//! quote or newline are quoted per RFC 4180; everything else is written
//! verbatim, so exports of ordinary names match the plain comma-joined
//! format byte for byte.

use std::collections::HashMap;
use std::path::Path;

use ecomonitor_core::models::{Dwelling, Resident, UsageRecord};
use ecomonitor_core::{MonitorError, Result};

/// Default file name offered for downloads.
pub const EXPORT_FILE_NAME: &str = "eco_village_usage.csv";

/// Header row of every export.
pub const CSV_HEADER: [&str; 4] = ["Date", "Resident", "Dwelling", "kWh"];

/// Serialize `records` in input order.
///
/// Residents or dwellings that cannot be resolved leave their column empty.
pub fn to_csv(
    records: &[UsageRecord],
    residents: &[Resident],
    dwellings: &[Dwelling],
) -> Result<String> {
    let residents: HashMap<&str, &Resident> =
        residents.iter().map(|r| (r.id.as_str(), r)).collect();
    let dwellings: HashMap<&str, &Dwelling> =
        dwellings.iter().map(|d| (d.id.as_str(), d)).collect();

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(export_error)?;

    for record in records {
        let resident = residents.get(record.resident_id.as_str());
        let dwelling = resident.and_then(|r| dwellings.get(r.dwelling_id.as_str()));
        let kwh = record.kwh.to_string();
        writer
            .write_record([
                record.date.as_str(),
                resident.map_or("", |r| r.name.as_str()),
                dwelling.map_or("", |d| d.name.as_str()),
                kwh.as_str(),
            ])
            .map_err(export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| MonitorError::Export(e.to_string()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| MonitorError::Export(e.to_string()))?;
    // The writer terminates every record; rows are only joined.
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Write the CSV export to `path`, returning the number of data rows.
pub fn export_csv(
    path: &Path,
    records: &[UsageRecord],
    residents: &[Resident],
    dwellings: &[Dwelling],
) -> Result<usize> {
    let text = to_csv(records, residents, dwellings)?;
    std::fs::write(path, text)?;
    tracing::info!(path = %path.display(), rows = records.len(), "usage exported");
    Ok(records.len())
}

fn export_error(e: csv::Error) -> MonitorError {
    MonitorError::Export(e.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
