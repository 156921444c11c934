use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

/// Device selection shared by the batch and monitor tools.
#[derive(Clone, Debug, Default, Args)]
pub struct DeviceArgs {
    /// Device names to query
    #[arg(long = "devices", value_name = "name", num_args = 1..)]
    pub devices: Vec<String>,

    /// File containing device names (one per line)
    #[arg(long = "file", value_name = "path")]
    pub file: Option<PathBuf>,
}

impl DeviceArgs {
    /// Names from `--devices` followed by names from `--file`.
    pub fn resolve(&self) -> Result<Vec<String>> {
        let mut names = self.devices.clone();
        if let Some(path) = &self.file {
            names.extend(read_device_file(path)?);
        }

        if names.is_empty() {
            bail!("No devices specified. Use --devices or --file");
        }
        Ok(names)
    }
}

pub fn read_device_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read device file {}", path.display()))?;
    Ok(parse_device_list(&content))
}

/// One name per line, trimmed, blank lines skipped.
pub fn parse_device_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
