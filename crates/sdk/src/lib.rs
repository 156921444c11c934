//! IoT API SDK - client for a cloud IoT device-management API.
//!
//! This crate provides the authenticated transport client, the device
//! operations facade (registration, status lookups, RRPC and custom
//! commands), and the batch/monitor callers built on top of them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use iotapi_sdk::{ClientOptions, Credentials, DeviceManager, IotClient};
//!
//! let credentials = Credentials::new("https://iot.example.com", "app-id", "app-secret");
//! let client = IotClient::authenticate(&credentials, ClientOptions::default()).await?;
//! let devices = DeviceManager::new(client);
//!
//! let status = devices.get_device_status(Some("sensor-01"), None).await?;
//! if devices.client().check_response(&status) {
//!     println!("{:?}", status.data);
//! }
//! ```

mod client;
mod error;
mod types;

pub mod batch;
pub mod device;
pub mod logging;
pub mod monitor;
pub mod report;

pub use batch::{batch_query, chunk_device_names, BatchOutcome, ChunkFailure};
pub use client::{ClientOptions, IotClient, Session, AUTH_ENDPOINT, TOKEN_HEADER};
pub use device::{DeviceManager, DEFAULT_RRPC_TIMEOUT_MS, MAX_BATCH_DEVICES};
pub use error::{IotError, Result};
pub use logging::{ClientLogger, LogFacade, SharedLogger};
pub use monitor::{run_monitor, MonitorConfig, StatusMonitor};
pub use report::{ReportFormat, StatusSummary};
pub use types::*;

/// Re-exported so callers can drive [`run_monitor`] without a direct dependency.
pub use tokio_util::sync::CancellationToken;
