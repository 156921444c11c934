use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use iotapi_cli::{connect, init_tracing, Config, DeviceArgs};
use iotapi_sdk::{run_monitor, CancellationToken, MonitorConfig};

/// Monitor device status continuously
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    devices: DeviceArgs,

    /// Check interval in seconds
    #[arg(long = "interval", value_name = "secs", default_value_t = 60)]
    interval: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let device_names = cli.devices.resolve()?;
    let config = Config::load()?;
    let devices = connect(&config).await?;

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_token.cancel(),
            Err(err) => tracing::error!("Error setting up signal handler: {}", err),
        }
    });

    println!(
        "Monitoring {} devices (interval: {}s)",
        device_names.len(),
        cli.interval
    );
    println!("Press Ctrl+C to stop\n");

    let monitor_config = MonitorConfig {
        interval: Duration::from_secs(cli.interval),
    };
    run_monitor(
        token,
        &devices,
        &device_names,
        &monitor_config,
        &mut io::stdout(),
    )
    .await?;

    println!("\nMonitoring stopped");
    Ok(())
}
