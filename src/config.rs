//! Configuration management for the status page

use crate::reconcile::NoDataPolicy;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the status API, queried as `{api_base}?days=N`
    pub api_base: String,

    /// Directory holding pre-generated `status_N.json` files. Takes
    /// precedence over `api_base` when set.
    pub data_dir: Option<PathBuf>,

    /// Range selected when the page is first loaded
    pub default_days: u32,

    /// Ranges offered by the range selection controls
    pub range_options: Vec<u32>,

    /// Interval of the periodic refresh
    pub refresh_interval: Duration,

    /// HTTP timeout for status requests
    pub http_timeout: Duration,

    /// Address the dashboard server binds to
    pub bind_address: String,

    /// Theme used when neither the cookie nor the client hint decide
    pub default_theme: Theme,

    /// How slots without data are drawn
    pub no_data_policy: NoDataPolicy,

    /// Draw one wide bar instead of a chart for single-day windows
    pub single_day_summary: bool,

    /// Display names by service alias
    pub service_names: BTreeMap<String, String>,

    /// Title of the rendered page
    pub page_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000/api/v1/status/".to_string(),
            data_dir: None,
            default_days: 1,
            range_options: vec![1, 7, 30, 90],
            refresh_interval: Duration::from_secs(5 * 60),
            http_timeout: Duration::from_secs(10),
            bind_address: "0.0.0.0:8080".to_string(),
            default_theme: Theme::Light,
            no_data_policy: NoDataPolicy::AssumeOperational,
            single_day_summary: false,
            service_names: BTreeMap::new(),
            page_title: "Service Status".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Values that fail to parse leave the default in place.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(api_base) = lookup("STATUS_API_BASE") {
            config.api_base = api_base;
        }

        if let Some(data_dir) = lookup("STATUS_DATA_DIR") {
            if !data_dir.trim().is_empty() {
                config.data_dir = Some(PathBuf::from(data_dir));
            }
        }

        if let Some(days) = lookup("DEFAULT_DAYS") {
            if let Ok(days) = days.trim().parse() {
                config.default_days = days;
            }
        }

        if let Some(ranges) = lookup("RANGE_OPTIONS") {
            let parsed: Vec<u32> = ranges
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if !parsed.is_empty() {
                config.range_options = parsed;
            }
        }

        if let Some(interval) = lookup("REFRESH_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.trim().parse::<u64>() {
                config.refresh_interval = Duration::from_secs(seconds);
            }
        }

        if let Some(timeout) = lookup("HTTP_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.trim().parse::<u64>() {
                config.http_timeout = Duration::from_secs(seconds);
            }
        }

        if let Some(bind_address) = lookup("BIND_ADDRESS") {
            config.bind_address = bind_address;
        }

        if let Some(theme) = lookup("DEFAULT_THEME") {
            if let Some(theme) = Theme::parse(&theme) {
                config.default_theme = theme;
            }
        }

        if let Some(policy) = lookup("NO_DATA_POLICY") {
            if let Ok(policy) = policy.parse() {
                config.no_data_policy = policy;
            }
        }

        if let Some(single_day) = lookup("SINGLE_DAY_SUMMARY") {
            config.single_day_summary = single_day.to_lowercase() == "true";
        }

        if let Some(names) = lookup("SERVICE_NAMES") {
            config.service_names = parse_service_names(&names);
        }

        if let Some(title) = lookup("PAGE_TITLE") {
            config.page_title = title;
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.is_none() && self.api_base.trim().is_empty() {
            return Err("either api_base or data_dir must be set".to_string());
        }

        if self.default_days == 0 {
            return Err("default_days must be greater than 0".to_string());
        }

        if self.range_options.is_empty() {
            return Err("at least one range option must be specified".to_string());
        }

        if self.range_options.contains(&0) {
            return Err("range options must be greater than 0".to_string());
        }

        if self.refresh_interval.is_zero() {
            return Err("refresh_interval must be greater than 0".to_string());
        }

        if self.bind_address.is_empty() {
            return Err("bind_address cannot be empty".to_string());
        }

        Ok(())
    }

    /// Whether `days` is one of the offered ranges.
    pub fn is_offered_range(&self, days: u32) -> bool {
        self.range_options.contains(&days)
    }
}

/// Parse `alias=Display Name` pairs separated by commas.
pub fn parse_service_names(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (alias, name) = pair.split_once('=')?;
            let (alias, name) = (alias.trim(), name.trim());
            if alias.is_empty() || name.is_empty() {
                return None;
            }
            Some((alias.to_string(), name.to_string()))
        })
        .collect()
}
