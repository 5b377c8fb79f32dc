//! Download quota tracking.

use crate::bounded;
use chrono::Utc;
use keyforge_core::license::LicenseKey;
use keyforge_core::ports::{DownloadOutcome, LicenseRepository};
use keyforge_core::validation::{DownloadResult, InvalidReason};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Enforces `download_count <= max_downloads` with a conditional increment.
pub struct DownloadTracker {
    licenses: Arc<dyn LicenseRepository>,
    timeout: Duration,
}

impl DownloadTracker {
    pub fn new(licenses: Arc<dyn LicenseRepository>, timeout: Duration) -> Self {
        Self { licenses, timeout }
    }

    /// Consume one download from the quota. Store failures deny the download.
    pub async fn record(&self, license: &LicenseKey) -> DownloadResult {
        let outcome = bounded(
            self.timeout,
            "increment_downloads",
            self.licenses.increment_downloads(license.id, Utc::now()),
        )
        .await;

        match outcome {
            Ok(DownloadOutcome::Recorded(updated)) => {
                info!(
                    license_id = %updated.id,
                    download_count = updated.download_count,
                    max_downloads = updated.max_downloads,
                    "Download recorded"
                );
                DownloadResult::allowed(&updated)
            }
            Ok(DownloadOutcome::LimitReached(current)) => {
                warn!(
                    license_id = %current.id,
                    max_downloads = current.max_downloads,
                    "Download limit reached"
                );
                DownloadResult::denied(InvalidReason::DownloadLimitExceeded)
            }
            Err(e) => {
                error!(license_id = %license.id, error = %e, "Download update failed, denying");
                DownloadResult::denied(InvalidReason::PersistenceFailure)
            }
        }
    }
}
