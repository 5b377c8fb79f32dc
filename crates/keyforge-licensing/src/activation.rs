//! Device activation tracking.

use crate::bounded;
use chrono::Utc;
use keyforge_core::license::{LicenseKey, LicenseStatus};
use keyforge_core::ports::{BindOutcome, LicenseRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of [`ActivationTracker::compare_and_bind`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    /// The fingerprint is bound. `license` is the row after the update.
    Accepted { license: LicenseKey, newly_bound: bool },
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// Every activation slot is taken. Carries the row as the store saw it.
    LimitReached(LicenseKey),
    /// The license left `Active` before the update landed.
    NotActive(LicenseStatus),
    /// The store failed or timed out; the update is treated as not applied.
    StoreFailure,
}

/// Enforces `activation_count <= max_activations` under concurrency.
///
/// The check and the increment are delegated to a single conditional store
/// update, so there is no read-modify-write window between callers.
pub struct ActivationTracker {
    licenses: Arc<dyn LicenseRepository>,
    timeout: Duration,
}

impl ActivationTracker {
    pub fn new(licenses: Arc<dyn LicenseRepository>, timeout: Duration) -> Self {
        Self { licenses, timeout }
    }

    /// Bind `fingerprint` to `license` if a slot is free.
    ///
    /// Fails closed: any store error or timeout is a rejection.
    pub async fn compare_and_bind(&self, license: &LicenseKey, fingerprint: &str) -> ActivationOutcome {
        let now = Utc::now();
        let outcome = bounded(
            self.timeout,
            "bind_device",
            self.licenses.bind_device(license.id, fingerprint, now),
        )
        .await;

        match outcome {
            Ok(BindOutcome::Bound(updated)) => {
                info!(
                    license_id = %updated.id,
                    activation_count = updated.activation_count(),
                    max_activations = updated.max_activations(),
                    "Device activated"
                );
                ActivationOutcome::Accepted {
                    license: updated,
                    newly_bound: true,
                }
            }
            Ok(BindOutcome::AlreadyBound(current)) => {
                debug!(license_id = %current.id, "Device bound concurrently by another request");
                ActivationOutcome::Accepted {
                    license: current,
                    newly_bound: false,
                }
            }
            Ok(BindOutcome::LimitReached(current)) => {
                warn!(
                    license_id = %current.id,
                    activation_count = current.activation_count(),
                    max_activations = current.max_activations(),
                    "Activation limit reached"
                );
                ActivationOutcome::Rejected(RejectReason::LimitReached(current))
            }
            Ok(BindOutcome::NotActive(current)) => {
                warn!(license_id = %current.id, status = ?current.status, "License left active state during activation");
                ActivationOutcome::Rejected(RejectReason::NotActive(current.status))
            }
            Err(e) => {
                error!(license_id = %license.id, error = %e, "Activation update failed, rejecting");
                ActivationOutcome::Rejected(RejectReason::StoreFailure)
            }
        }
    }
}
