//! Application configuration
//!
//! ## Configuration Resolution
//!
//! The first file found wins:
//! 1. Explicit path (`--config`)
//! 2. `SUBTRACK_CONFIG` environment variable
//! 3. User config dir (`~/.config/subtrack/config.toml` on Linux)
//! 4. Embedded defaults (compiled into binary)
//!
//! Values missing from a file keep their defaults. `SUBTRACK_STORE` and
//! `SUBTRACK_REMOTE_URL` override the file afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::recurrence::MonthEndPolicy;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/subtrack.toml");

pub const CONFIG_ENV: &str = "SUBTRACK_CONFIG";
pub const STORE_ENV: &str = "SUBTRACK_STORE";
pub const REMOTE_URL_ENV: &str = "SUBTRACK_REMOTE_URL";

/// Which record store backs the tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Local,
    Remote,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "sqlite" => Ok(Self::Local),
            "remote" | "http" => Ok(Self::Remote),
            other => Err(format!(
                "Unknown store backend: {}. Available: local, remote",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteConfig {
    pub url: Option<String>,
    pub collection: String,
    /// Name of the environment variable holding the bearer token
    pub token_env: String,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            collection: "subscriptions".to_string(),
            token_env: "SUBTRACK_REMOTE_TOKEN".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RemoteConfig {
    /// Bearer token read from the configured environment variable
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderConfig {
    pub interval: Duration,
    pub lead_days: Vec<i64>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            lead_days: vec![0, 1, 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayConfig {
    pub currency_symbol: String,
    pub month_end: MonthEndPolicy,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₩".to_string(),
            month_end: MonthEndPolicy::Clamp,
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    pub backend: StoreBackend,
    pub remote: RemoteConfig,
    pub reminders: ReminderConfig,
    pub display: DisplayConfig,
    /// File the values came from (`None` = embedded defaults)
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load using the standard resolution order, then apply env overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_path(explicit)? {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                let mut config = parse_config(&content)?;
                config.source = Some(path);
                config
            }
            None => parse_config(DEFAULT_CONFIG)?,
        };

        config.apply_env()?;
        debug!(
            source = ?config.source,
            backend = config.backend.as_str(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Embedded defaults without consulting files or environment
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(backend) = std::env::var(STORE_ENV) {
            self.backend = backend.parse().map_err(Error::Config)?;
        }
        if let Ok(url) = std::env::var(REMOTE_URL_ENV) {
            if !url.trim().is_empty() {
                self.remote.url = Some(url);
            }
        }
        Ok(())
    }
}

/// User config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("subtrack").join("config.toml"))
}

fn resolve_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        // An explicit file must exist
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!(path = %path.display(), "{} points to a missing file, ignoring", CONFIG_ENV);
    }

    Ok(default_config_path().filter(|p| p.exists()))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    store: Option<RawStore>,
    remote: Option<RawRemote>,
    reminders: Option<RawReminders>,
    display: Option<RawDisplay>,
}

#[derive(Debug, Deserialize)]
struct RawStore {
    backend: Option<StoreBackend>,
}

#[derive(Debug, Deserialize)]
struct RawRemote {
    url: Option<String>,
    collection: Option<String>,
    token_env: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawReminders {
    interval_minutes: Option<u64>,
    lead_days: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
struct RawDisplay {
    currency_symbol: Option<String>,
    month_end: Option<MonthEndPolicy>,
}

/// Longest reminder interval accepted, in minutes
pub const MAX_INTERVAL_MINUTES: u64 = u64::MAX / 60;

/// Reminder interval for a minute count; `None` for zero or an out-of-range value
pub fn interval_from_minutes(minutes: u64) -> Option<Duration> {
    if minutes == 0 {
        return None;
    }
    minutes.checked_mul(60).map(Duration::from_secs)
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(store) = raw.store {
        if let Some(backend) = store.backend {
            config.backend = backend;
        }
    }

    if let Some(remote) = raw.remote {
        config.remote.url = remote.url.filter(|u| !u.trim().is_empty());
        if let Some(collection) = remote.collection {
            config.remote.collection = collection;
        }
        if let Some(token_env) = remote.token_env {
            config.remote.token_env = token_env;
        }
        if let Some(timeout) = remote.timeout_secs {
            config.remote.timeout = Duration::from_secs(timeout);
        }
    }

    if let Some(reminders) = raw.reminders {
        if let Some(minutes) = reminders.interval_minutes {
            config.reminders.interval = interval_from_minutes(minutes).ok_or_else(|| {
                Error::Config(format!(
                    "reminders.interval_minutes must be between 1 and {}, got {}",
                    MAX_INTERVAL_MINUTES, minutes
                ))
            })?;
        }
        if let Some(mut lead_days) = reminders.lead_days {
            if lead_days.iter().any(|d| *d < 0) {
                return Err(Error::Config(
                    "reminders.lead_days must not be negative".to_string(),
                ));
            }
            lead_days.sort_unstable();
            lead_days.dedup();
            config.reminders.lead_days = lead_days;
        }
    }

    if let Some(display) = raw.display {
        if let Some(symbol) = display.currency_symbol {
            config.display.currency_symbol = symbol;
        }
        if let Some(policy) = display.month_end {
            config.display.month_end = policy;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.backend, StoreBackend::Local);
        assert_eq!(config.remote.collection, "subscriptions");
        assert_eq!(config.remote.url, None);
        assert_eq!(config.reminders.interval, Duration::from_secs(3600));
        assert_eq!(config.reminders.lead_days, vec![0, 1, 3]);
        assert_eq!(config.display.currency_symbol, "₩");
        assert_eq!(config.display.month_end, MonthEndPolicy::Clamp);
    }

    #[test]
    fn test_default_matches_embedded() {
        let embedded = Config::embedded().unwrap();
        assert_eq!(embedded, Config::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [store]
            backend = "remote"

            [remote]
            url = "http://localhost:9000/api"

            [display]
            month_end = "overflow"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, StoreBackend::Remote);
        assert_eq!(config.remote.url.as_deref(), Some("http://localhost:9000/api"));
        assert_eq!(config.remote.timeout, Duration::from_secs(10));
        assert_eq!(config.display.month_end, MonthEndPolicy::Overflow);
        assert_eq!(config.reminders.lead_days, vec![0, 1, 3]);
    }

    #[test]
    fn test_lead_days_sorted_and_deduped() {
        let config = parse_config("[reminders]\nlead_days = [7, 1, 1, 0]\n").unwrap();
        assert_eq!(config.reminders.lead_days, vec![0, 1, 7]);
    }

    #[test]
    fn test_interval_from_minutes() {
        assert_eq!(interval_from_minutes(0), None);
        assert_eq!(interval_from_minutes(15), Some(Duration::from_secs(900)));
        assert_eq!(
            interval_from_minutes(MAX_INTERVAL_MINUTES),
            Some(Duration::from_secs(MAX_INTERVAL_MINUTES * 60))
        );
        assert_eq!(interval_from_minutes(MAX_INTERVAL_MINUTES + 1), None);
        assert_eq!(interval_from_minutes(u64::MAX), None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_config("[reminders]\ninterval_minutes = 0\n").is_err());
        assert!(parse_config("[reminders]\ninterval_minutes = 9223372036854775807\n").is_err());
        assert!(parse_config("[reminders]\nlead_days = [-1]\n").is_err());
        assert!(parse_config("[store]\nbackend = \"ftp\"\n").is_err());
        assert!(parse_config("not toml at all [").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\ncurrency_symbol = \"$\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.display.currency_symbol, "$");
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = Config::load(Some(Path::new("/nonexistent/subtrack.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("Remote".parse::<StoreBackend>(), Ok(StoreBackend::Remote));
        assert_eq!("sqlite".parse::<StoreBackend>(), Ok(StoreBackend::Local));
        assert!("s3".parse::<StoreBackend>().is_err());
    }
}
