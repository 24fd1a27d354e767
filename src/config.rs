//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::time::Duration;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Interval in seconds between background cache refreshes
    pub refresh_interval: u64,
    /// Whether caches refresh themselves in the background
    pub auto_refresh: bool,
    /// Default number of movies per page
    pub page_size: usize,
    /// Allowed CORS origin, any origin when unset
    pub cors_origin: Option<String>,
    /// JSON file holding the movie documents
    pub data_path: String,
    /// Disables all log output
    pub log_silent: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REFRESH_INTERVAL` - Cache refresh interval in seconds (default: 3600)
    /// - `AUTO_REFRESH` - Background refresh toggle (default: true)
    /// - `PAGE_SIZE` - Default movie page size (default: 500)
    /// - `CORS_ORIGIN` - Allowed origin (default: any)
    /// - `CATALOG_DATA_PATH` - Movie documents file (default: data/movies.json)
    /// - `LOG_SILENT` - Silence logs (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            refresh_interval: parse_var("REFRESH_INTERVAL").unwrap_or(defaults.refresh_interval),
            auto_refresh: parse_var("AUTO_REFRESH").unwrap_or(defaults.auto_refresh),
            page_size: parse_var("PAGE_SIZE").unwrap_or(defaults.page_size),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
            data_path: env::var("CATALOG_DATA_PATH").unwrap_or(defaults.data_path),
            log_silent: parse_var("LOG_SILENT").unwrap_or(defaults.log_silent),
        }
    }

    /// Refresh interval as a Duration.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            refresh_interval: 3600,
            auto_refresh: true,
            page_size: 500,
            cors_origin: None,
            data_path: "data/movies.json".to_string(),
            log_silent: false,
        }
    }
}
