//! Store client configuration.
//!
//! Resolution order, lowest precedence first: built-in defaults, a TOML
//! file, then the `WIDECOL_HOST` / `WIDECOL_PORT` environment variables.
//! Command-line flags are applied on top by the binaries.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the store host.
pub const ENV_HOST: &str = "WIDECOL_HOST";

/// Environment variable overriding the store port.
pub const ENV_PORT: &str = "WIDECOL_PORT";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is present but unusable.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// The offending key or variable.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Where the store lives and how long to wait for it.
///
/// # Example
///
/// ```rust
/// use widecol_common::config::StoreConfig;
///
/// let config = StoreConfig::new().host("hbase.internal").port(9091);
/// assert_eq!(config.addr(), "hbase.internal:9091");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store hostname.
    #[serde(default = "default_host")]
    pub host: String,

    /// Store port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Per-request read/write timeout in milliseconds. Zero disables it.
    #[serde(default)]
    pub io_timeout_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9090
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            io_timeout_ms: 0,
        }
    }
}

impl StoreConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the per-request I/O timeout.
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Returns `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the connection timeout.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the I/O timeout, if one is configured.
    pub fn io_timeout_duration(&self) -> Option<Duration> {
        (self.io_timeout_ms > 0).then(|| Duration::from_millis(self.io_timeout_ms))
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Applies `WIDECOL_HOST` / `WIDECOL_PORT` from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            let host = host.trim();
            if host.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_HOST.to_string(),
                    reason: "host must not be empty".to_string(),
                });
            }
            self.host = host.to_string();
        }

        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_PORT.to_string(),
                reason: format!("{e}"),
            })?;
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 9090);
        assert_eq!(config.io_timeout_duration(), None);
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new()
            .host("store.local")
            .port(9999)
            .io_timeout(Duration::from_secs(2));

        assert_eq!(config.addr(), "store.local:9999");
        assert_eq!(config.io_timeout_duration(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [(ENV_HOST, "10.0.0.5"), (ENV_PORT, "19090")]
            .into_iter()
            .collect();

        let config = StoreConfig::default()
            .with_overrides_from(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 19090);
    }

    #[test]
    fn test_env_override_bad_port() {
        let result = StoreConfig::default().with_overrides_from(|k| {
            (k == ENV_PORT).then(|| "not-a-port".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_toml_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("widecol.toml");

        let config = StoreConfig::new().host("test.host").port(7070);
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = StoreConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: StoreConfig = toml::from_str(r#"host = "db.example.com""#).unwrap();
        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.port, 9090);
        assert_eq!(config.connect_timeout_ms, 5_000);
    }
}
