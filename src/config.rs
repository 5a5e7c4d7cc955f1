//! Runtime configuration
//!
//! Values come from the environment; anything unset falls back to a default
//! under the platform data directory.

use crate::error::{AppError, AppResult};
use crate::recurrence::LeapDayPolicy;
use log::info;
use std::env;
use std::path::PathBuf;
use url::Url;

pub const DB_PATH_VAR: &str = "DATEKEEPER_DB_PATH";
pub const MESSAGE_URL_VAR: &str = "DATEKEEPER_MESSAGE_URL";
pub const LEAP_POLICY_VAR: &str = "DATEKEEPER_LEAP_POLICY";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Remote greeting generator; cards use canned text when unset.
    pub message_url: Option<String>,
    /// Overrides the stored leap day setting when present.
    pub leap_day_policy: Option<LeapDayPolicy>,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("datekeeper")
        .join("datekeeper.db")
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let leap_day_policy = var(LEAP_POLICY_VAR)
            .map(|value| value.parse::<LeapDayPolicy>())
            .transpose()?;

        Ok(Self {
            db_path: var(DB_PATH_VAR).map(PathBuf::from).unwrap_or_else(default_db_path),
            message_url: var(MESSAGE_URL_VAR).map(|v| v.trim().to_string()),
            leap_day_policy,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            message_url: None,
            leap_day_policy: None,
        }
    }
}

/// Checks a message generator endpoint: absolute, https, with a host.
pub fn validate_message_url(message_url: &str) -> AppResult<Url> {
    let parsed = Url::parse(message_url)
        .map_err(|e| AppError::config(format!("Invalid message URL '{}': {}", message_url, e)))?;

    if parsed.scheme() != "https" {
        return Err(AppError::config(format!(
            "Message URL must use HTTPS, got '{}://'",
            parsed.scheme()
        )));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(AppError::config(format!(
            "Message URL '{}' has no host",
            message_url
        ))),
    }
}

pub fn validate_config(config: &AppConfig) -> AppResult<()> {
    if let Some(message_url) = &config.message_url {
        validate_message_url(message_url)?;
    }

    if config.db_path.as_os_str().is_empty() {
        return Err(AppError::config("Database path is empty"));
    }

    info!(
        "Configuration valid (db: {}, leap policy: {}, message generator: {})",
        config.db_path.display(),
        config.leap_day_policy.map_or("from settings", |p| p.as_str()),
        if config.message_url.is_some() { "remote" } else { "canned" }
    );
    Ok(())
}
