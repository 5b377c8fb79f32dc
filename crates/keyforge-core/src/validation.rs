//! Structured outcomes of validation and download requests.
//!
//! Validation is expected to fail routinely (expired trials, shared keys),
//! so failures are values that callers branch on rather than errors.

use crate::license::{LicenseKey, LicenseStatus};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Why a license was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    NotFound,
    Expired,
    Revoked,
    Suspended,
    ActivationLimitExceeded,
    DownloadLimitExceeded,
    /// The store could not be reached or did not confirm an update in time.
    PersistenceFailure,
}

impl InvalidReason {
    /// Reason reported for a license sitting in a non-active status.
    pub fn from_status(status: LicenseStatus) -> Option<Self> {
        match status {
            LicenseStatus::Active => None,
            LicenseStatus::Expired => Some(InvalidReason::Expired),
            LicenseStatus::Revoked => Some(InvalidReason::Revoked),
            LicenseStatus::Suspended => Some(InvalidReason::Suspended),
        }
    }
}

/// Result of `validate(key, fingerprint)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activations_remaining: Option<u32>,
    pub validated_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn success(license: &LicenseKey, product_name: impl Into<String>) -> Self {
        Self {
            valid: true,
            reason: None,
            product_name: Some(product_name.into()),
            expires_at: license.expires_at,
            downloads_remaining: Some(license.downloads_remaining()),
            activations_remaining: Some(license.activations_remaining()),
            validated_at: Utc::now(),
        }
    }

    pub fn failure(reason: InvalidReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            product_name: None,
            expires_at: None,
            downloads_remaining: None,
            activations_remaining: None,
            validated_at: Utc::now(),
        }
    }
}

/// Result of `record_download(key)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DownloadResult {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads_remaining: Option<u32>,
}

impl DownloadResult {
    pub fn allowed(license: &LicenseKey) -> Self {
        Self {
            allowed: true,
            reason: None,
            downloads_remaining: Some(license.downloads_remaining()),
        }
    }

    pub fn denied(reason: InvalidReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            downloads_remaining: None,
        }
    }
}
