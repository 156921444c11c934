//! Shared plumbing for the `iot-client`, `batch-query` and `device-monitor`
//! binaries.

pub mod config;
pub mod devices;
pub mod output;

mod main_lib;

pub use config::{Config, ConfigError, CredentialSource};
pub use devices::DeviceArgs;
pub use main_lib::{connect, init_tracing};
