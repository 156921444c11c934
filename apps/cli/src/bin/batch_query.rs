use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use iotapi_cli::output::emit_batch;
use iotapi_cli::{connect, init_tracing, Config, DeviceArgs};
use iotapi_sdk::{batch_query, ReportFormat};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Format {
    #[default]
    Json,
    Csv,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ReportFormat::Json,
            Format::Csv => ReportFormat::Csv,
        }
    }
}

/// Batch query device status
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    devices: DeviceArgs,

    /// Output format
    #[arg(long = "format", value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Output file (default: stdout)
    #[arg(long = "output", value_name = "path")]
    output: Option<PathBuf>,
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

    let outcome = batch_query(&devices, &device_names).await;

    let format = ReportFormat::from(cli.format);
    let mut err = io::stderr().lock();
    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            emit_batch(&outcome, format, BufWriter::new(file), &mut err)
        }
        None => emit_batch(&outcome, format, io::stdout().lock(), &mut err),
    }
}
