//! Rendering of status query results: JSON, CSV and status counts.

use std::fmt;
use std::io::Write;

use serde_json::Value;
use thiserror::Error;

use crate::types::{DeviceStatus, DeviceStatusRecord};

/// Fixed CSV columns.
pub const CSV_HEADERS: [&str; 4] = ["deviceName", "status", "timestamp", "lastOnlineTime"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output encoding for status records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

// ─────────────────────────────────────────────────────────────────────────────
// Summary
// ─────────────────────────────────────────────────────────────────────────────

/// Per-status device counts. `total` also includes devices whose status is
/// missing or outside the three counted values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub unactive: usize,
}

impl StatusSummary {
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = DeviceStatus>,
    {
        statuses.into_iter().fold(Self::default(), |mut summary, status| {
            summary.total += 1;
            match status {
                DeviceStatus::Online => summary.online += 1,
                DeviceStatus::Offline => summary.offline += 1,
                DeviceStatus::Unactive => summary.unactive += 1,
                DeviceStatus::Other(_) | DeviceStatus::Unknown => {}
            }
            summary
        })
    }

    pub fn from_records(records: &[DeviceStatusRecord]) -> Self {
        Self::from_statuses(records.iter().map(DeviceStatusRecord::status))
    }

    /// Short form used by the monitor: `Online: a, Offline: b, Unactive: c`.
    pub fn counts_line(&self) -> String {
        format!(
            "Online: {}, Offline: {}, Unactive: {}",
            self.online, self.offline, self.unactive
        )
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Summary: Total={}, Online={}, Offline={}, Unactive={}",
            self.total, self.online, self.offline, self.unactive
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Writers
// ─────────────────────────────────────────────────────────────────────────────

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Write records as a pretty-printed JSON array, each record exactly as received.
pub fn write_json<W: Write>(records: &[DeviceStatusRecord], mut writer: W) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write records as CSV with the [`CSV_HEADERS`] columns. Cells hold the raw
/// server values; absent and `null` values are empty.
pub fn write_csv<W: Write>(records: &[DeviceStatusRecord], writer: W) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADERS)?;

    for record in records {
        wtr.write_record([
            cell(record.get("deviceName")),
            cell(record.status_value()),
            cell(record.timestamp()),
            cell(record.last_online_time()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_report<W: Write>(
    records: &[DeviceStatusRecord],
    format: ReportFormat,
    writer: W,
) -> Result<(), ReportError> {
    match format {
        ReportFormat::Json => write_json(records, writer),
        ReportFormat::Csv => write_csv(records, writer),
    }
}
