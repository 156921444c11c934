use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use iotapi_cli::output::{emit_response, Render};
use iotapi_cli::{connect, init_tracing, Config, ConfigError};
use iotapi_sdk::{ApiResponse, DEFAULT_RRPC_TIMEOUT_MS};

#[derive(Debug, Parser)]
#[command(version, about = "IoT Device Management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Device(DeviceCommand),
    /// Report where credentials would be loaded from
    Check,
}

#[derive(Debug, Subcommand)]
enum DeviceCommand {
    /// Register a new device
    Register {
        /// Product key
        #[arg(long = "product-key", value_name = "key")]
        product_key: String,
        /// Device name (optional)
        #[arg(long = "device-name", value_name = "name")]
        device_name: Option<String>,
        /// Device display name (optional)
        #[arg(long = "nick-name", value_name = "name")]
        nick_name: Option<String>,
    },
    /// Get device status
    Status(Lookup),
    /// Get device details
    Detail(Lookup),
    /// Send an RRPC message and wait for the device reply
    Rrpc {
        /// Device name
        #[arg(long = "device-name", value_name = "name")]
        device_name: String,
        /// Product key
        #[arg(long = "product-key", value_name = "key")]
        product_key: String,
        /// Message content
        #[arg(long = "message", value_name = "text")]
        message: String,
        /// Timeout in ms
        #[arg(long = "timeout", value_name = "ms", default_value_t = DEFAULT_RRPC_TIMEOUT_MS)]
        timeout: u64,
    },
    /// Send a custom downlink command
    Command {
        /// Device name
        #[arg(long = "device-name", value_name = "name")]
        device_name: String,
        /// Message content
        #[arg(long = "message", value_name = "text")]
        message: String,
    },
}

#[derive(Debug, clap::Args)]
struct Lookup {
    /// Device name
    #[arg(long = "device-name", value_name = "name")]
    device_name: Option<String>,
    /// Device ID
    #[arg(long = "device-id", value_name = "id")]
    device_id: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Command::Device(command) => run(command).await,
        Command::Check => check(),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: DeviceCommand) -> Result<bool> {
    let config = Config::load()?;
    let devices = connect(&config).await?;

    let (response, render): (ApiResponse, Render) = match command {
        DeviceCommand::Register {
            product_key,
            device_name,
            nick_name,
        } => (
            devices
                .register_device(&product_key, device_name.as_deref(), nick_name.as_deref())
                .await?
                .into(),
            Render::Data,
        ),
        DeviceCommand::Status(lookup) => (
            devices
                .get_device_status(lookup.device_name.as_deref(), lookup.device_id.as_deref())
                .await?
                .into(),
            Render::Data,
        ),
        DeviceCommand::Detail(lookup) => (
            devices
                .get_device_detail(lookup.device_name.as_deref(), lookup.device_id.as_deref())
                .await?
                .into(),
            Render::Data,
        ),
        DeviceCommand::Rrpc {
            device_name,
            product_key,
            message,
            timeout,
        } => (
            devices
                .send_rrpc_message(&device_name, &product_key, &message, Some(timeout))
                .await?
                .into(),
            Render::Whole,
        ),
        DeviceCommand::Command {
            device_name,
            message,
        } => (
            devices
                .send_custom_command(&device_name, &message)
                .await?
                .into(),
            Render::Whole,
        ),
    };

    emit_response(
        devices.client(),
        &response,
        render,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )
}

fn check() -> Result<bool> {
    match Config::load() {
        Ok(config) => {
            println!("Credentials found ({})", config.source);
            println!("  base_url: {}", config.credentials.base_url);
            println!("  app_id: {}", config.credentials.app_id);
            Ok(true)
        }
        Err(e @ ConfigError::NotFound(_)) => {
            eprintln!("Error: {}", e);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
