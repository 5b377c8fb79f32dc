//! Licensing engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for issuance and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensingConfig {
    /// Prefix used when neither the request nor the product names one.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Insert attempts before giving up with `KeyspaceExhausted`.
    #[serde(default = "default_max_key_attempts")]
    pub max_key_attempts: u32,
    /// Activation quota for `multi` licenses.
    #[serde(default = "default_multi_activation_limit")]
    pub multi_activation_limit: u32,
    /// Deadline for each store call.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Deadline for writing a piracy alert.
    #[serde(default = "default_alert_timeout_ms")]
    pub alert_timeout_ms: u64,
}

fn default_key_prefix() -> String {
    "LIC".to_string()
}

fn default_max_key_attempts() -> u32 {
    10
}

fn default_multi_activation_limit() -> u32 {
    5
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_alert_timeout_ms() -> u64 {
    2_000
}

impl Default for LicensingConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            max_key_attempts: default_max_key_attempts(),
            multi_activation_limit: default_multi_activation_limit(),
            store_timeout_ms: default_store_timeout_ms(),
            alert_timeout_ms: default_alert_timeout_ms(),
        }
    }
}

impl LicensingConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn alert_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_timeout_ms)
    }

    /// Set the default key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the insert attempt cap.
    pub fn with_max_key_attempts(mut self, attempts: u32) -> Self {
        self.max_key_attempts = attempts;
        self
    }

    /// Set the activation quota for multi-device licenses.
    pub fn with_multi_activation_limit(mut self, limit: u32) -> Self {
        self.multi_activation_limit = limit;
        self
    }

    /// Set the per-call store deadline.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the alert write deadline.
    pub fn with_alert_timeout(mut self, timeout: Duration) -> Self {
        self.alert_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
