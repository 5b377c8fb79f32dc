//! CLI configuration management.
//!
//! Sources, later ones winning: built-in defaults, the YAML file in the
//! platform config directory, then `KEYFORGE_*` environment variables
//! (nested keys use `__`, e.g. `KEYFORGE_LICENSING__KEY_PREFIX`). A `.env`
//! file in the working directory is loaded first.

use keyforge_licensing::LicensingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// PostgreSQL connection string.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Licensing engine settings.
    #[serde(default)]
    pub licensing: LicensingConfig,
}

fn default_database_url() -> String {
    "postgres://localhost:5432/keyforge".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            output_format: OutputFormat::default(),
            licensing: LicensingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl CliConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(Self::config_path()?).required(false))
            .add_source(
                ::config::Environment::with_prefix("KEYFORGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let dirs = directories::ProjectDirs::from("dev", "keyforge", "keyforge")
            .ok_or("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.yaml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_all_defaults() {
        let config: CliConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.database_url, default_database_url());
        assert_eq!(config.output_format, OutputFormat::Table);
        assert_eq!(config.licensing, LicensingConfig::default());
    }

    #[test]
    fn test_nested_licensing_section() {
        let yaml = "output_format: json\nlicensing:\n  key_prefix: PRO\n  max_key_attempts: 4\n";
        let config: CliConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.licensing.key_prefix, "PRO");
        assert_eq!(config.licensing.max_key_attempts, 4);
        assert_eq!(config.licensing.multi_activation_limit, 5);
    }
}
