//! Continuous device status monitoring.
//!
//! Every cycle queries all devices, diffs the result against the previous
//! cycle and reports either the changes or a status count. The loop stops
//! only when its cancellation token fires.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::batch::batch_query;
use crate::device::DeviceManager;
use crate::report::StatusSummary;
use crate::types::{DeviceStatus, DeviceStatusRecord};

/// Default time between monitor cycles.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(60);

/// Device name to last observed status.
pub type StatusSnapshot = BTreeMap<String, DeviceStatus>;

pub fn snapshot_from_records(records: &[DeviceStatusRecord]) -> StatusSnapshot {
    records
        .iter()
        .map(|record| (record.device_name().to_string(), record.status()))
        .collect()
}

/// A device whose status differs between two cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub device: String,
    pub old: DeviceStatus,
    pub new: DeviceStatus,
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.device, self.old, self.new)
    }
}

/// Devices present in both snapshots whose status changed.
///
/// Devices that only appear in `current` are not changes.
pub fn diff_snapshots(previous: &StatusSnapshot, current: &StatusSnapshot) -> Vec<StatusChange> {
    current
        .iter()
        .filter_map(|(device, new)| match previous.get(device) {
            Some(old) if old != new => Some(StatusChange {
                device: device.clone(),
                old: old.clone(),
                new: new.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// What a single cycle has to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    Changes(Vec<StatusChange>),
    Summary(StatusSummary),
}

impl CycleReport {
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            CycleReport::Changes(changes) => {
                writeln!(out, "  Status changes detected:")?;
                for change in changes {
                    writeln!(out, "    {}", change)?;
                }
            }
            CycleReport::Summary(summary) => writeln!(out, "  {}", summary.counts_line())?,
        }
        Ok(())
    }
}

/// Holds the previous snapshot between cycles.
#[derive(Debug, Default)]
pub struct StatusMonitor {
    previous: StatusSnapshot,
}

impl StatusMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> &StatusSnapshot {
        &self.previous
    }

    /// Compare `current` with the previous snapshot, then replace it.
    pub fn observe(&mut self, current: StatusSnapshot) -> CycleReport {
        let changes = diff_snapshots(&self.previous, &current);
        let report = if changes.is_empty() {
            CycleReport::Summary(StatusSummary::from_statuses(current.values().cloned()))
        } else {
            CycleReport::Changes(changes)
        };
        self.previous = current;
        report
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_MONITOR_INTERVAL,
        }
    }
}

/// Run monitor cycles until `ctx` is cancelled.
///
/// Cancellation is observed both while a cycle's queries are in flight and
/// while waiting for the next cycle. A cycle interrupted mid-query writes no
/// report. Query failures leave devices out of that cycle's snapshot.
pub async fn run_monitor<W: Write>(
    ctx: CancellationToken,
    manager: &DeviceManager,
    device_names: &[String],
    config: &MonitorConfig,
    out: &mut W,
) -> io::Result<()> {
    let mut monitor = StatusMonitor::new();

    loop {
        writeln!(
            out,
            "[{}] Checking devices...",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancelled() => break,
            outcome = batch_query(manager, device_names) => outcome,
        };
        monitor
            .observe(snapshot_from_records(&outcome.records))
            .write_to(out)?;
        out.flush()?;

        tokio::select! {
            biased;
            _ = ctx.cancelled() => break,
            _ = tokio::time::sleep(config.interval) => {}
        }
    }

    Ok(())
}
