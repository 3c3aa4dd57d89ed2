//! Application configuration

use api_client::{ClientConfig, DEFAULT_ENDPOINT};
use std::path::PathBuf;
use std::time::Duration;
use storage::KvConfig;

use crate::logging::{LogFormat, LoggingConfig};

/// Environment variable overriding the GraphQL endpoint
pub const ENDPOINT_ENV: &str = "TELESOSMED_ENDPOINT";
/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TELESOSMED_DATA_DIR";
/// Environment variable overriding the request timeout, in seconds
pub const TIMEOUT_ENV: &str = "TELESOSMED_TIMEOUT_SECS";
/// Environment variable overriding the default log filter
pub const LOG_FILTER_ENV: &str = "TELESOSMED_LOG";
/// Environment variable selecting the log format (`text` or `pretty`)
pub const LOG_FORMAT_ENV: &str = "TELESOSMED_LOG_FORMAT";

const CREDENTIAL_DB: &str = "credentials.db";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// GraphQL endpoint
    pub endpoint: String,
    /// Directory holding the credential database
    pub data_dir: PathBuf,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Default log filter directive
    pub log_filter: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            data_dir: PathBuf::from("./telesosmed_data"),
            request_timeout: Duration::from_secs(30),
            log_filter: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Create a configuration for a custom endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Defaults, overridden by `TELESOSMED_*` environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(endpoint) = var(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            config.endpoint = endpoint;
        }
        if let Some(dir) = var(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        match var(TIMEOUT_ENV).map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
            Some(_) => tracing::warn!(var = TIMEOUT_ENV, "ignoring invalid timeout"),
            None => {}
        }
        if let Some(filter) = var(LOG_FILTER_ENV).filter(|v| !v.is_empty()) {
            config.log_filter = filter;
        }
        if let Some(format) = var(LOG_FORMAT_ENV) {
            match format.parse() {
                Ok(format) => config.log_format = format,
                Err(e) => tracing::warn!(var = LOG_FORMAT_ENV, error = %e, "ignoring invalid log format"),
            }
        }
        config
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the default log filter
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Set the log format
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Path of the credential database
    pub fn credential_db_path(&self) -> PathBuf {
        self.data_dir.join(CREDENTIAL_DB)
    }

    /// GraphQL client configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.endpoint.clone()).with_timeout(self.request_timeout)
    }

    /// Subscriber settings for [`crate::logging::init`]
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::new(self.log_format, self.log_filter.clone())
    }

    /// Credential database configuration
    pub fn kv_config(&self) -> KvConfig {
        KvConfig::new(self.credential_db_path().to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.endpoint, "https://api.andika.my.id");
        assert_eq!(config.credential_db_path(), PathBuf::from("./telesosmed_data/credentials.db"));
        assert_eq!(config.client_config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let config = AppConfig::new("http://localhost:4000")
            .with_data_dir("/tmp/tele")
            .with_timeout(Duration::from_secs(5))
            .with_log_filter("debug");

        assert_eq!(config.client_config().endpoint, "http://localhost:4000");
        assert_eq!(config.kv_config().path, "/tmp/tele/credentials.db");
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_logging_config_follows_app_config() {
        let config = AppConfig::default()
            .with_log_filter("telesosmed=debug,api_client=trace")
            .with_log_format(LogFormat::Pretty);

        let logging = config.logging_config();
        assert_eq!(logging.filter, "telesosmed=debug,api_client=trace");
        assert_eq!(logging.format, LogFormat::Pretty);
        assert_eq!(AppConfig::default().logging_config(), LoggingConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENDPOINT_ENV, "http://staging:4000"),
            (DATA_DIR_ENV, ""),
            (TIMEOUT_ENV, "abc"),
            (LOG_FILTER_ENV, "warn"),
            (LOG_FORMAT_ENV, "json"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_vars(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.endpoint, "http://staging:4000");
        assert_eq!(config.data_dir, AppConfig::default().data_dir);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.log_format, LogFormat::Text);
    }
}
