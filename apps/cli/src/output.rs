use std::io::Write;

use anyhow::Result;
use iotapi_sdk::report::write_report;
use iotapi_sdk::{ApiResponse, BatchOutcome, IotClient, ReportFormat};
use serde_json::Value;

/// Which part of a successful response is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    /// Only the `data` field
    Data,
    /// The whole response, decoded fields included
    Whole,
}

/// Print a response as pretty JSON to `out`, or its error message to `err`.
///
/// Returns `false` when the platform reported a failure.
pub fn emit_response<W, E>(
    client: &IotClient,
    response: &ApiResponse,
    render: Render,
    out: &mut W,
    err: &mut E,
) -> Result<bool>
where
    W: Write,
    E: Write,
{
    let envelope = response.envelope();
    if !client.check_response(envelope) {
        writeln!(err, "Error: {}", envelope.error_message_or_default())?;
        return Ok(false);
    }

    let body = match render {
        Render::Data => serde_json::to_string_pretty(envelope.data.as_ref().unwrap_or(&Value::Null))?,
        Render::Whole => serde_json::to_string_pretty(response)?,
    };
    writeln!(out, "{}", body)?;
    Ok(true)
}

/// Write a batch report to `out` and its summary to `err`.
///
/// Chunk failures are not repeated here; the SDK logger already reported each
/// one on stderr.
pub fn emit_batch<W, E>(
    outcome: &BatchOutcome,
    format: ReportFormat,
    out: W,
    err: &mut E,
) -> Result<()>
where
    W: Write,
    E: Write,
{
    write_report(&outcome.records, format, out)?;
    writeln!(err)?;
    writeln!(err, "{}", outcome.summary())?;
    Ok(())
}
