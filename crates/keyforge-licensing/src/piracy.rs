//! Key-sharing detection.

use crate::bounded;
use chrono::Utc;
use keyforge_core::alert::{AlertSeverity, AlertType, PiracyAlert};
use keyforge_core::ids::AlertId;
use keyforge_core::license::LicenseKey;
use keyforge_core::ports::AlertSink;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Raises alerts when a license is presented by more devices than it allows.
///
/// Alerting never influences the validation outcome: write failures are
/// logged and swallowed.
pub struct PiracyDetector {
    sink: Arc<dyn AlertSink>,
    timeout: Duration,
}

impl PiracyDetector {
    pub fn new(sink: Arc<dyn AlertSink>, timeout: Duration) -> Self {
        Self { sink, timeout }
    }

    /// Build the alert for a rejected activation.
    pub fn key_sharing_alert(license: &LicenseKey, fingerprint: &str) -> PiracyAlert {
        PiracyAlert {
            id: AlertId::new(),
            license_id: license.id,
            alert_type: AlertType::KeySharing,
            severity: AlertSeverity::High,
            details: json!({
                "activation_count": license.activation_count(),
                "max_activations": license.max_activations(),
                "fingerprint": fingerprint,
                "key_prefix": license.key_hint(),
            }),
            created_at: Utc::now(),
        }
    }

    /// Record a key-sharing alert for `license`.
    pub async fn on_activation_limit_exceeded(&self, license: &LicenseKey, fingerprint: &str) {
        let alert = Self::key_sharing_alert(license, fingerprint);
        warn!(
            license_id = %license.id,
            alert_id = %alert.id,
            fingerprint,
            "Possible key sharing detected"
        );

        if let Err(e) = bounded(self.timeout, "record_alert", self.sink.record(&alert)).await {
            error!(license_id = %license.id, alert_id = %alert.id, error = %e, "Failed to record piracy alert");
        }
    }
}
