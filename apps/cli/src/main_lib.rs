use anyhow::Result;
use iotapi_sdk::{DeviceManager, IotClient};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

/// Install the global subscriber. Logs go to stderr so stdout stays usable
/// for JSON and CSV output.
pub fn init_tracing() {
    let log_format = std::env::var("IOT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Authenticate with the configured credentials.
pub async fn connect(config: &Config) -> Result<DeviceManager> {
    tracing::debug!("Using credentials from {}", config.source);
    let client = IotClient::authenticate(&config.credentials, config.client_options()).await?;
    Ok(DeviceManager::new(client))
}
