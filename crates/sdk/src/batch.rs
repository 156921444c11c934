//! Chunked batch status queries.
//!
//! Device lists of any length are split into chunks of [`MAX_BATCH_DEVICES`]
//! and queried one chunk after another. A failed chunk is logged and recorded,
//! and the remaining chunks still run.

use std::fmt;
use std::slice::Chunks;

use crate::device::{DeviceManager, MAX_BATCH_DEVICES};
use crate::error::IotError;
use crate::report::StatusSummary;
use crate::types::DeviceStatusRecord;

/// Split a device list into request-sized chunks, preserving order.
pub fn chunk_device_names(device_names: &[String]) -> Chunks<'_, String> {
    device_names.chunks(MAX_BATCH_DEVICES)
}

/// A chunk that produced no records.
#[derive(Debug)]
pub struct ChunkFailure {
    /// 1-based chunk number
    pub batch: usize,
    pub message: String,
    /// Transport, HTTP or decode error behind the failure. `None` when the
    /// platform answered with `success=false`.
    pub source: Option<IotError>,
}

impl ChunkFailure {
    /// The platform answered but reported the call as failed.
    pub fn is_application_error(&self) -> bool {
        self.source.is_none()
    }
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error querying batch {}: {}", self.batch, self.message)
    }
}

/// Aggregated result of a chunked query.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Records of all successful chunks, in chunk order
    pub records: Vec<DeviceStatusRecord>,
    pub failures: Vec<ChunkFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary::from_records(&self.records)
    }
}

/// Query the status of every device, one chunk at a time.
///
/// Each failed chunk is logged once through the client's logger at error
/// level.
pub async fn batch_query(manager: &DeviceManager, device_names: &[String]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for (index, chunk) in chunk_device_names(device_names).enumerate() {
        match query_chunk(manager, chunk).await {
            Ok(records) => outcome.records.extend(records),
            Err((message, source)) => {
                let failure = ChunkFailure {
                    batch: index + 1,
                    message,
                    source,
                };
                manager.client().logger().error(&failure.to_string());
                outcome.failures.push(failure);
            }
        }
    }

    outcome
}

type ChunkError = (String, Option<IotError>);

async fn query_chunk(
    manager: &DeviceManager,
    chunk: &[String],
) -> std::result::Result<Vec<DeviceStatusRecord>, ChunkError> {
    let envelope = manager
        .batch_get_device_status(chunk, &[])
        .await
        .map_err(|e| (e.to_string(), Some(e)))?;

    if !envelope.success {
        return Err((envelope.error_message_or_default().to_string(), None));
    }

    envelope.status_records().map_err(|e| {
        (
            format!("Unexpected status data: {}", e),
            Some(IotError::Json(e)),
        )
    })
}
