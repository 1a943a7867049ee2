use crate::db::{resolve_db_filename, resolve_db_path};
use crate::error::AppError;
use crate::market::coingecko::COINGECKO_BASE_URL;
use crate::market::types::{FetchArgs, FetchConfig, SimulatorArgs, SimulatorConfig};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub const API_BASE_URL_VAR: &str = "MARKETDESK_API_BASE_URL";
pub const FETCH_MAX_RETRIES_VAR: &str = "MARKETDESK_FETCH_MAX_RETRIES";
pub const FETCH_TIMEOUT_MS_VAR: &str = "MARKETDESK_FETCH_TIMEOUT_MS";
pub const FETCH_BACKOFF_MS_VAR: &str = "MARKETDESK_FETCH_BACKOFF_MS";
pub const SIMULATOR_INTERVAL_MS_VAR: &str = "MARKETDESK_SIMULATOR_INTERVAL_MS";
pub const DATA_DIR_VAR: &str = "MARKETDESK_DATA_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub fetch: FetchConfig,
    pub simulator: SimulatorConfig,
    pub data_dir: PathBuf,
    pub db_filename: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: COINGECKO_BASE_URL.to_string(),
            fetch: FetchConfig::default(),
            simulator: SimulatorConfig::default(),
            data_dir: PathBuf::from("."),
            db_filename: crate::db::DEFAULT_DB_FILENAME.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.db_filename = resolve_db_filename();
        Ok(config)
    }

    /// Builds the config from a variable lookup. Blank or unparsable values fall back to
    /// defaults; parsed values still go through range validation.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let fetch = FetchArgs {
            max_retries: parse_var(&lookup, FETCH_MAX_RETRIES_VAR),
            timeout_ms: parse_var(&lookup, FETCH_TIMEOUT_MS_VAR),
            backoff_base_ms: parse_var(&lookup, FETCH_BACKOFF_MS_VAR),
        }
        .normalize()?;

        let simulator = SimulatorArgs {
            interval_ms: parse_var(&lookup, SIMULATOR_INTERVAL_MS_VAR),
        }
        .normalize()?;

        let defaults = Self::default();
        Ok(Self {
            api_base_url: non_blank(&lookup, API_BASE_URL_VAR).unwrap_or(defaults.api_base_url),
            fetch,
            simulator,
            data_dir: non_blank(&lookup, DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            db_filename: defaults.db_filename,
        })
    }

    pub fn db_path(&self) -> Result<PathBuf, AppError> {
        resolve_db_path(&self.data_dir, &self.db_filename)
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = non_blank(lookup, key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}
