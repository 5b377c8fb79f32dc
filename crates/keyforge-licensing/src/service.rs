//! Entry point consumed by the transport layer.

use crate::activation::ActivationTracker;
use crate::bounded;
use crate::config::LicensingConfig;
use crate::downloads::DownloadTracker;
use crate::issuer::{CustomSettings, LicenseIssuer};
use crate::piracy::PiracyDetector;
use crate::validator::Validator;
use keyforge_core::Result;
use keyforge_core::ids::ProductId;
use keyforge_core::license::LicenseKey;
use keyforge_core::ports::{AlertSink, LicenseRepository, ProductCatalog};
use keyforge_core::validation::{DownloadResult, ValidationResult};
use std::sync::Arc;

/// Issuance, validation and download accounting over a set of ports.
pub struct LicenseService {
    licenses: Arc<dyn LicenseRepository>,
    issuer: LicenseIssuer,
    validator: Validator,
    config: LicensingConfig,
}

impl LicenseService {
    pub fn new(
        licenses: Arc<dyn LicenseRepository>,
        products: Arc<dyn ProductCatalog>,
        alerts: Arc<dyn AlertSink>,
        config: LicensingConfig,
    ) -> Self {
        let store_timeout = config.store_timeout();
        let validator = Validator::new(
            licenses.clone(),
            products.clone(),
            ActivationTracker::new(licenses.clone(), store_timeout),
            DownloadTracker::new(licenses.clone(), store_timeout),
            PiracyDetector::new(alerts, config.alert_timeout()),
            store_timeout,
        );
        let issuer = LicenseIssuer::new(licenses.clone(), products, config.clone());

        Self {
            licenses,
            issuer,
            validator,
            config,
        }
    }

    /// Issue a new license. See [`LicenseIssuer::generate`].
    pub async fn generate(
        &self,
        product_id: ProductId,
        customer_email: &str,
        customer_order_id: &str,
        settings: Option<CustomSettings>,
    ) -> Result<LicenseKey> {
        self.issuer
            .generate(product_id, customer_email, customer_order_id, settings)
            .await
    }

    /// Validate a key for a device. See [`Validator::validate`].
    pub async fn validate(&self, key_string: &str, device_fingerprint: &str) -> ValidationResult {
        self.validator.validate(key_string, device_fingerprint).await
    }

    /// Consume one download. See [`Validator::record_download`].
    pub async fn record_download(&self, key_string: &str) -> DownloadResult {
        self.validator.record_download(key_string).await
    }

    /// Fetch a license without side effects.
    pub async fn lookup(&self, key_string: &str) -> Result<Option<LicenseKey>> {
        bounded(
            self.config.store_timeout(),
            "get_by_key",
            self.licenses.get_by_key(key_string),
        )
        .await
    }

    pub fn config(&self) -> &LicensingConfig {
        &self.config
    }
}
