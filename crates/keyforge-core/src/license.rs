//! License key types.

use crate::ids::{LicenseId, ProductId};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An issued license key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LicenseKey {
    pub id: LicenseId,
    pub product_id: ProductId,
    pub customer_email: String,
    pub customer_order_id: String,
    /// The key handed to the customer. Globally unique.
    pub key_string: String,
    pub status: LicenseStatus,
    pub max_downloads: u32,
    pub download_count: u32,
    /// Activation quota and the devices consuming it.
    pub activations: DeviceBindings,
    /// `None` for perpetual licenses.
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LicenseKey {
    pub fn activation_count(&self) -> u32 {
        self.activations.activation_count()
    }

    pub fn max_activations(&self) -> u32 {
        self.activations.max_activations()
    }

    pub fn activations_remaining(&self) -> u32 {
        self.activations.remaining()
    }

    pub fn downloads_remaining(&self) -> u32 {
        self.max_downloads.saturating_sub(self.download_count)
    }

    pub fn is_bound_to(&self, fingerprint: &str) -> bool {
        self.activations.contains(fingerprint)
    }

    /// Leading part of the key, safe to put in logs.
    pub fn key_hint(&self) -> &str {
        key_hint(&self.key_string)
    }
}

/// Truncate a key string to a loggable hint.
pub fn key_hint(key: &str) -> &str {
    match key.char_indices().nth(8) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}

/// License status.
///
/// `Active` may lazily become `Expired`; `Revoked` and `Suspended` are set
/// by administrative tooling and are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseStatus {
    Active,
    Expired,
    Revoked,
    Suspended,
}

impl LicenseStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, LicenseStatus::Active)
    }
}

/// Outcome of trying to add a fingerprint to a [`DeviceBindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindAttempt {
    Bound,
    AlreadyBound,
    Full,
}

/// The set of device fingerprints bound to a license, together with the
/// activation quota.
///
/// The activation count is the size of the set, so the two can never drift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeviceBindings {
    max_activations: u32,
    devices: BTreeSet<String>,
}

impl DeviceBindings {
    pub fn new(max_activations: u32) -> Self {
        Self {
            max_activations,
            devices: BTreeSet::new(),
        }
    }

    /// Rebuild bindings from persisted parts. Duplicate fingerprints collapse.
    pub fn from_parts(max_activations: u32, devices: impl IntoIterator<Item = String>) -> Self {
        Self {
            max_activations,
            devices: devices.into_iter().collect(),
        }
    }

    pub fn max_activations(&self) -> u32 {
        self.max_activations
    }

    pub fn activation_count(&self) -> u32 {
        u32::try_from(self.devices.len()).unwrap_or(u32::MAX)
    }

    pub fn remaining(&self) -> u32 {
        self.max_activations.saturating_sub(self.activation_count())
    }

    pub fn has_capacity(&self) -> bool {
        self.activation_count() < self.max_activations
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.devices.contains(fingerprint)
    }

    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(String::as_str)
    }

    /// Check-and-add in one step. Callers that share the bindings across
    /// tasks must hold their lock across this call.
    pub fn try_bind(&mut self, fingerprint: &str) -> BindAttempt {
        if self.devices.contains(fingerprint) {
            return BindAttempt::AlreadyBound;
        }
        if !self.has_capacity() {
            return BindAttempt::Full;
        }
        self.devices.insert(fingerprint.to_string());
        BindAttempt::Bound
    }
}
