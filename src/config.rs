//! Runtime configuration, loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) reproduces
//! the stock deployment: temperature in Chandigarh from open-meteo plus the
//! bitcoin price in USD from CoinGecko, logged to `data_log.csv` with
//! timestamps in IST and a seven day retention window.
//!
//! ```toml
//! file = "/var/lib/meteolog/data_log.csv"
//! timezone = "UTC"
//! on_partial = "sentinel"
//!
//! [header]
//! timestamp = "Timestamp"
//! first = "Temperature (°C)"
//! second = "Bitcoin Price (USD)"
//!
//! [first]
//! label = "temperature"
//! url = "https://api.open-meteo.com/v1/forecast?latitude=30.74&longitude=76.78&current=temperature_2m"
//! path = "current.temperature_2m"
//!
//! [second]
//! label = "bitcoin"
//! url = "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd"
//! path = "bitcoin.usd"
//!
//! [fetch]
//! timeout_secs = 10
//! max_attempts = 3
//! retry_delay_secs = 3
//!
//! [retention]
//! kind = "max_age"
//! days = 7
//! ```

use crate::fetch::error::FetchError;
use crate::fetch::fetcher::{Fetcher, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT};
use crate::fetch::source::DataSource;
use crate::store::log_store::LogStore;
use crate::trim::RetentionPolicy;
use crate::types::clock::{LogClock, UnknownZoneError};
use crate::types::record::Header;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_FILE: &str = "data_log.csv";
const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
const DEFAULT_LATITUDE: f64 = 30.74;
const DEFAULT_LONGITUDE: f64 = 76.78;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    UnknownZone(#[from] UnknownZoneError),
}

/// What to do with a cycle in which one of the two readings is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialPolicy {
    /// Store the row with `N/A` in place of the missing reading.
    #[default]
    Sentinel,
    /// Don't store anything for this cycle.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: DEFAULT_RETRY_DELAY.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path of the CSV log.
    pub file: PathBuf,
    pub header: Header,
    /// `UTC` or an IANA zone name such as `Asia/Kolkata`.
    pub timezone: String,
    pub first: DataSource,
    pub second: DataSource,
    pub fetch: FetchSettings,
    pub retention: RetentionPolicy,
    pub on_partial: PartialPolicy,
    /// When set, the binary keeps running and logs a row this often.
    pub interval_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_FILE),
            header: Header::default(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            first: DataSource::open_meteo_temperature(DEFAULT_LATITUDE, DEFAULT_LONGITUDE),
            second: DataSource::coingecko_price("bitcoin", "usd"),
            fetch: FetchSettings::default(),
            retention: RetentionPolicy::default(),
            on_partial: PartialPolicy::default(),
            interval_secs: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Rejects settings that would make every cycle fail or wipe the log.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("`file` must not be empty".into()));
        }
        if self.header.columns().iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid("header labels must not be empty".into()));
        }
        for (name, source) in [("first", &self.first), ("second", &self.second)] {
            if !(source.url.starts_with("http://") || source.url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "`{name}.url` must be an http(s) URL, got '{}'",
                    source.url
                )));
            }
            if source.path.to_string().is_empty() {
                return Err(ConfigError::Invalid(format!("`{name}.path` must not be empty")));
            }
        }
        match self.retention {
            RetentionPolicy::MaxAge { days: 0 } => {
                return Err(ConfigError::Invalid("`retention.days` must be at least 1".into()))
            }
            RetentionPolicy::MaxRows { rows: 0 } => {
                return Err(ConfigError::Invalid("`retention.rows` must be at least 1".into()))
            }
            _ => {}
        }
        if self.interval_secs == Some(0) {
            return Err(ConfigError::Invalid("`interval_secs` must be positive".into()));
        }
        self.clock()?;
        Ok(())
    }

    pub fn clock(&self) -> Result<LogClock, ConfigError> {
        Ok(LogClock::from_name(&self.timezone)?)
    }

    pub fn store(&self) -> LogStore {
        LogStore::new(&self.file, self.header.clone())
    }

    pub fn fetcher(&self) -> Result<Fetcher, FetchError> {
        Fetcher::builder()
            .timeout(Duration::from_secs(self.fetch.timeout_secs))
            .max_attempts(self.fetch.max_attempts)
            .retry_delay(Duration::from_secs(self.fetch.retry_delay_secs))
            .build()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }
}
