//! Port traits (hexagonal architecture).
//!
//! These traits define the store, catalog, and alerting contracts the
//! licensing core relies on. Adapters live in `keyforge-db`.

use crate::alert::PiracyAlert;
use crate::ids::{LicenseId, ProductId};
use crate::license::LicenseKey;
use crate::product::DigitalProduct;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of the atomic device-binding update.
#[derive(Debug, Clone, PartialEq)]
pub enum BindOutcome {
    /// Fingerprint added and activation count incremented.
    Bound(LicenseKey),
    /// Fingerprint was already bound; nothing changed.
    AlreadyBound(LicenseKey),
    /// Activation quota already consumed; nothing changed.
    LimitReached(LicenseKey),
    /// License is no longer active; nothing changed.
    NotActive(LicenseKey),
}

/// Outcome of the atomic download-count update.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Recorded(LicenseKey),
    LimitReached(LicenseKey),
}

/// Persistence for license keys.
#[async_trait]
pub trait LicenseRepository: Send + Sync {
    /// Insert a new license. A key string that is already taken fails with
    /// [`crate::Error::DuplicateKey`] and leaves nothing behind.
    async fn insert(&self, license: &LicenseKey) -> Result<()>;

    /// Get a license by ID.
    async fn get(&self, id: LicenseId) -> Result<Option<LicenseKey>>;

    /// Get a license by its key string.
    async fn get_by_key(&self, key_string: &str) -> Result<Option<LicenseKey>>;

    /// Bind a fingerprint as one indivisible operation: the capacity check,
    /// the set insertion and the count increment happen together or not at all.
    async fn bind_device(
        &self,
        id: LicenseId,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome>;

    /// Increment the download count only while it is below the limit.
    async fn increment_downloads(&self, id: LicenseId, now: DateTime<Utc>)
    -> Result<DownloadOutcome>;

    /// Move an active license to expired. A no-op for any other status.
    async fn mark_expired(&self, id: LicenseId) -> Result<()>;

    /// Update the last-accessed timestamp.
    async fn touch(&self, id: LicenseId, now: DateTime<Utc>) -> Result<()>;
}

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get(&self, id: ProductId) -> Result<Option<DigitalProduct>>;
}

/// Destination for piracy alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn record(&self, alert: &PiracyAlert) -> Result<()>;
}
