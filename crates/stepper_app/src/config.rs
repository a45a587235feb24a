use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;
use stepper_engine::{BackendSettings, DEFAULT_BASE_URL};
use url::Url;

use crate::logging::{LogDestination, DEFAULT_LOG_FILE};

pub const ENV_API_BASE_URL: &str = "STEPPER_API_BASE_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "STEPPER_POLL_INTERVAL_MS";
pub const ENV_LOG: &str = "STEPPER_LOG";
pub const ENV_LOG_LEVEL: &str = "STEPPER_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "STEPPER_LOG_FILE";
pub const ENV_DEBUG: &str = "STEPPER_DEBUG";

const DEFAULT_START_URL: &str = "http://localhost:3000/";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendSettings,
    pub start_url: Url,
    pub log_destination: LogDestination,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
    /// Print the raw state after every change.
    pub debug: bool,
    /// Problems found while reading the environment, reported once logging is up.
    pub warnings: Vec<String>,
}

impl AppConfig {
    /// Reads configuration from `lookup` (normally the process environment)
    /// and the optional start URL argument. Invalid values fall back to the
    /// default and leave a warning behind.
    pub fn from_lookup<F>(lookup: F, start_url: Option<&str>) -> Result<Self, url::ParseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        let base_url = lookup(ENV_API_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut backend = BackendSettings::with_base_url(base_url);
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => backend.poll_interval = Duration::from_millis(ms),
                _ => warnings.push(format!("ignoring invalid {ENV_POLL_INTERVAL_MS}={raw}")),
            }
        }
        if let Err(err) = Url::parse(&backend.base_url) {
            warnings.push(format!("{ENV_API_BASE_URL} is not a valid url: {err}"));
        }

        let log_destination = match lookup(ENV_LOG) {
            None => LogDestination::Terminal,
            Some(raw) => LogDestination::parse(&raw).unwrap_or_else(|| {
                warnings.push(format!("ignoring invalid {ENV_LOG}={raw}"));
                LogDestination::Terminal
            }),
        };

        let log_level = match lookup(ENV_LOG_LEVEL) {
            None => LevelFilter::Info,
            Some(raw) => raw.trim().parse::<LevelFilter>().unwrap_or_else(|_| {
                warnings.push(format!("ignoring invalid {ENV_LOG_LEVEL}={raw}"));
                LevelFilter::Info
            }),
        };

        let log_file = lookup(ENV_LOG_FILE)
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from);

        let debug =
            lookup(ENV_DEBUG).is_some_and(|raw| matches!(raw.trim(), "1" | "true" | "yes"));

        let start_url = Url::parse(start_url.unwrap_or(DEFAULT_START_URL))?;

        Ok(Self {
            backend,
            start_url,
            log_destination,
            log_level,
            log_file,
            debug,
            warnings,
        })
    }

    pub fn from_env(start_url: Option<&str>) -> Result<Self, url::ParseError> {
        Self::from_lookup(|key| std::env::var(key).ok(), start_url)
    }
}
