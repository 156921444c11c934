use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use iotapi_sdk::{ClientOptions, Credentials};
use thiserror::Error;

pub const ENV_BASE_URL: &str = "IOT_BASE_URL";
pub const ENV_APP_ID: &str = "IOT_APP_ID";
pub const ENV_APP_SECRET: &str = "IOT_APP_SECRET";
pub const ENV_CREDENTIALS_FILE: &str = "IOT_CREDENTIALS_FILE";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "IOT_REQUEST_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No credentials found. Set IOT_BASE_URL, IOT_APP_ID, IOT_APP_SECRET environment variables or create {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid credentials file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Invalid IOT_REQUEST_TIMEOUT_MS value: {0}")]
    Timeout(String),
}

/// Where the credentials were taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    File(PathBuf),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub source: CredentialSource,
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from `.env`, the process environment and the
    /// credentials file, in that order of precedence for credentials.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let request_timeout = request_timeout(&lookup)?;

        if let Some(credentials) = credentials_from_lookup(&lookup) {
            return Ok(Self {
                credentials,
                source: CredentialSource::Environment,
                request_timeout,
            });
        }

        let path = credentials_file_path(&lookup);
        match path.as_deref() {
            Some(path) if path.exists() => Ok(Self {
                credentials: read_credentials_file(path)?,
                source: CredentialSource::File(path.to_path_buf()),
                request_timeout,
            }),
            _ => Err(ConfigError::NotFound(describe_path(path.as_deref()))),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        let options = ClientOptions::default();
        match self.request_timeout {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        }
    }
}

/// Credentials from the environment, only when all three variables are set.
fn credentials_from_lookup<F>(lookup: &F) -> Option<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
    Some(Credentials::new(
        var(ENV_BASE_URL)?,
        var(ENV_APP_ID)?,
        var(ENV_APP_SECRET)?,
    ))
}

/// `IOT_CREDENTIALS_FILE`, else `~/.config/iotapi/credentials.json`.
pub fn credentials_file_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_CREDENTIALS_FILE)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config/iotapi/credentials.json")))
}

pub fn read_credentials_file(path: &Path) -> Result<Credentials, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn request_timeout<F>(lookup: &F) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(ENV_REQUEST_TIMEOUT_MS) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|millis| Some(Duration::from_millis(millis)))
            .map_err(|_| ConfigError::Timeout(raw)),
    }
}

fn describe_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.config/iotapi/credentials.json".to_string())
}
