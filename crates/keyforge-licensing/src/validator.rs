//! License validation: the license state machine.
//!
//! ```text
//!   Active ──(expires_at passed, observed on access)──▶ Expired
//!   Revoked / Suspended: set by administrative tooling, terminal
//! ```
//!
//! Expiry is evaluated lazily on each request and persisted the first time
//! it is observed. There is no background sweep.

use crate::activation::{ActivationOutcome, ActivationTracker, RejectReason};
use crate::bounded;
use crate::downloads::DownloadTracker;
use crate::expiration::ExpirationPolicy;
use crate::piracy::PiracyDetector;
use chrono::Utc;
use keyforge_core::license::{LicenseKey, key_hint};
use keyforge_core::ports::{LicenseRepository, ProductCatalog};
use keyforge_core::product::DigitalProduct;
use keyforge_core::validation::{DownloadResult, InvalidReason, ValidationResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Orchestrates lookup, expiry, activation and piracy detection.
pub struct Validator {
    licenses: Arc<dyn LicenseRepository>,
    products: Arc<dyn ProductCatalog>,
    activation: ActivationTracker,
    downloads: DownloadTracker,
    piracy: PiracyDetector,
    timeout: Duration,
}

impl Validator {
    pub fn new(
        licenses: Arc<dyn LicenseRepository>,
        products: Arc<dyn ProductCatalog>,
        activation: ActivationTracker,
        downloads: DownloadTracker,
        piracy: PiracyDetector,
        timeout: Duration,
    ) -> Self {
        Self {
            licenses,
            products,
            activation,
            downloads,
            piracy,
            timeout,
        }
    }

    /// Validate `key_string` for use on `device_fingerprint`.
    ///
    /// Always returns a structured result; failures are reported through
    /// `reason`, never as errors.
    pub async fn validate(&self, key_string: &str, device_fingerprint: &str) -> ValidationResult {
        let license = match self.admit(key_string).await {
            Ok(license) => license,
            Err(reason) => return ValidationResult::failure(reason),
        };

        let product = match self.product_for(&license).await {
            Ok(product) => product,
            Err(reason) => return ValidationResult::failure(reason),
        };

        if !product.requires_activation || license.is_bound_to(device_fingerprint) {
            self.touch(&license).await;
            debug!(license_id = %license.id, "License valid without new activation");
            return ValidationResult::success(&license, product.name);
        }

        match self.activation.compare_and_bind(&license, device_fingerprint).await {
            ActivationOutcome::Accepted {
                license,
                newly_bound,
            } => {
                if !newly_bound {
                    self.touch(&license).await;
                }
                info!(license_id = %license.id, "License validated");
                ValidationResult::success(&license, product.name)
            }
            ActivationOutcome::Rejected(RejectReason::LimitReached(current)) => {
                self.piracy
                    .on_activation_limit_exceeded(&current, device_fingerprint)
                    .await;
                ValidationResult::failure(InvalidReason::ActivationLimitExceeded)
            }
            ActivationOutcome::Rejected(RejectReason::NotActive(status)) => ValidationResult::failure(
                InvalidReason::from_status(status).unwrap_or(InvalidReason::PersistenceFailure),
            ),
            ActivationOutcome::Rejected(RejectReason::StoreFailure) => {
                ValidationResult::failure(InvalidReason::PersistenceFailure)
            }
        }
    }

    /// Consume one download for `key_string`, subject to the same status
    /// and expiry checks as validation.
    pub async fn record_download(&self, key_string: &str) -> DownloadResult {
        match self.admit(key_string).await {
            Ok(license) => self.downloads.record(&license).await,
            Err(reason) => DownloadResult::denied(reason),
        }
    }

    /// Look the license up and reject it if it is not usable right now.
    /// Persists the expired status the first time expiry is observed.
    async fn admit(&self, key_string: &str) -> Result<LicenseKey, InvalidReason> {
        let lookup = bounded(self.timeout, "get_by_key", self.licenses.get_by_key(key_string)).await;
        let license = match lookup {
            Ok(Some(license)) => license,
            Ok(None) => {
                info!(key_prefix = key_hint(key_string), "License not found");
                return Err(InvalidReason::NotFound);
            }
            Err(e) => {
                error!(key_prefix = key_hint(key_string), error = %e, "License lookup failed");
                return Err(InvalidReason::PersistenceFailure);
            }
        };

        if let Some(reason) = InvalidReason::from_status(license.status) {
            debug!(license_id = %license.id, status = ?license.status, "License not active");
            return Err(reason);
        }

        if ExpirationPolicy::is_expired(license.expires_at, Utc::now()) {
            self.expire(&license).await;
            return Err(InvalidReason::Expired);
        }

        Ok(license)
    }

    async fn expire(&self, license: &LicenseKey) {
        match bounded(self.timeout, "mark_expired", self.licenses.mark_expired(license.id)).await {
            Ok(()) => info!(license_id = %license.id, expires_at = ?license.expires_at, "License expired"),
            // The outcome is Expired either way; the next request retries the write.
            Err(e) => warn!(license_id = %license.id, error = %e, "Failed to persist expired status"),
        }
    }

    async fn product_for(&self, license: &LicenseKey) -> Result<DigitalProduct, InvalidReason> {
        match bounded(self.timeout, "get_product", self.products.get(license.product_id)).await {
            Ok(Some(product)) => Ok(product),
            Ok(None) => {
                warn!(license_id = %license.id, product_id = %license.product_id, "Product missing for license");
                Err(InvalidReason::NotFound)
            }
            Err(e) => {
                error!(license_id = %license.id, error = %e, "Product lookup failed");
                Err(InvalidReason::PersistenceFailure)
            }
        }
    }

    async fn touch(&self, license: &LicenseKey) {
        if let Err(e) = bounded(self.timeout, "touch", self.licenses.touch(license.id, Utc::now())).await {
            warn!(license_id = %license.id, error = %e, "Failed to update last access time");
        }
    }
}
