//! Configuration file support for the CLI.
//!
//! Loads and saves CLI configuration from TOML files. The `[store]` table
//! is a [`StoreConfig`]; the rest are CLI preferences.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use widecol_common::StoreConfig;
use widecol_data::{Schema, SeedPlan};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default output format.
    #[serde(default = "default_format")]
    pub output_format: String,

    /// Schema file; the storefront schema is used when unset.
    #[serde(default)]
    pub schema_file: Option<PathBuf>,

    /// Store address and timeouts.
    #[serde(default)]
    pub store: StoreConfig,

    /// Row counts used by `init`.
    #[serde(default)]
    pub seed: SeedPlan,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            output_format: default_format(),
            schema_file: None,
            store: StoreConfig::default(),
            seed: SeedPlan::default(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Loads the default configuration file.
    ///
    /// Looks in the following locations:
    /// 1. ~/.config/widecol/config.toml
    /// 2. ~/.widecol/config.toml
    /// 3. Returns default if not found
    pub fn load_default() -> Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("widecol").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".widecol").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// The schema to provision and query against.
    pub fn schema(&self) -> Result<Schema> {
        match &self.schema_file {
            Some(path) => Schema::from_file(path)
                .with_context(|| format!("failed to load schema {}", path.display())),
            None => Ok(Schema::storefront()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.store.addr(), "localhost:9090");
        assert_eq!(config.output_format, "table");
        assert_eq!(config.schema().unwrap(), Schema::storefront());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = CliConfig::default();
        config.store = StoreConfig::new().host("test.host").port(9999);
        config.seed.products = 10;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = CliConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            output_format = "json"

            [store]
            host = "hbase.example.com"

            [seed]
            users = 7
        "#;

        let config: CliConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.store.host, "hbase.example.com");
        assert_eq!(config.store.port, 9090);
        assert_eq!(config.output_format, "json");
        assert_eq!(config.seed.users, 7);
        assert_eq!(config.seed.products, 100);
    }

    #[test]
    fn test_schema_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schema.toml");
        std::fs::write(&path, "[[table]]\nname = \"notes\"\nfamilies = [\"body\"]\n").unwrap();

        let config = CliConfig {
            schema_file: Some(path),
            ..CliConfig::default()
        };
        assert_eq!(config.schema().unwrap().names(), vec!["notes"]);
    }
}
