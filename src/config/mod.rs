//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The store password is wrapped in secrecy::SecretString to prevent log leaks.

pub mod secrets;

use crate::error::{Error, Result};
use secrets::SecretString;
use std::path::{Path, PathBuf};

/// Connection settings for the Redis queue store.
#[derive(Debug)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct Config {
    pub store: StoreConfig,
    /// Root directory for worker result artifacts. Only the worker needs it.
    pub result_folder: Option<PathBuf>,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let port = required_var("REDIS_PORT")?;
        let port = port.parse::<u16>().map_err(|e| {
            Error::Config(format!("REDIS_PORT must be a port number, got {port:?}: {e}"))
        })?;

        Ok(Self {
            host: required_var("REDIS_HOST")?,
            port,
            password: SecretString::from(required_var("REDIS_PASSWORD")?),
        })
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            store: StoreConfig::from_env()?,
            result_folder: optional_var("RESULT_FOLDER").map(PathBuf::from),
            otel_endpoint: optional_var("OTEL_ENDPOINT"),
            log_level: optional_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// The result root, or a configuration error if `RESULT_FOLDER` is unset.
    pub fn result_folder(&self) -> Result<&Path> {
        self.result_folder.as_deref().ok_or_else(|| {
            Error::Config("required environment variable RESULT_FOLDER is not set".to_string())
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    optional_var(name)
        .ok_or_else(|| Error::Config(format!("required environment variable {name} is not set")))
}

/// Empty values count as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
