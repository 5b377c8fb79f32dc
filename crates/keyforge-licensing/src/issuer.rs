//! License issuance.

use crate::bounded;
use crate::config::LicensingConfig;
use crate::expiration::ExpirationPolicy;
use crate::keygen::KeyGenerator;
use chrono::Utc;
use keyforge_core::ids::{LicenseId, ProductId};
use keyforge_core::license::{DeviceBindings, LicenseKey, LicenseStatus};
use keyforge_core::ports::{LicenseRepository, ProductCatalog};
use keyforge_core::product::{DigitalProduct, LicenseType};
use keyforge_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Activation quota recorded for unlimited licenses. Fits a signed 32-bit column.
pub const UNLIMITED_ACTIVATIONS: u32 = i32::MAX as u32;

/// Per-order overrides of the product's licensing terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSettings {
    #[serde(default)]
    pub max_activations: Option<u32>,
    #[serde(default)]
    pub max_downloads: Option<u32>,
    #[serde(default)]
    pub access_duration_days: Option<u32>,
    #[serde(default)]
    pub key_prefix: Option<String>,
}

/// Issues license keys at purchase time.
pub struct LicenseIssuer {
    licenses: Arc<dyn LicenseRepository>,
    products: Arc<dyn ProductCatalog>,
    config: LicensingConfig,
}

impl LicenseIssuer {
    pub fn new(
        licenses: Arc<dyn LicenseRepository>,
        products: Arc<dyn ProductCatalog>,
        config: LicensingConfig,
    ) -> Self {
        Self {
            licenses,
            products,
            config,
        }
    }

    /// Issue a license for `product_id`.
    ///
    /// Uniqueness is decided by the store: a colliding key is regenerated and
    /// the insert retried, up to `max_key_attempts` times.
    pub async fn generate(
        &self,
        product_id: ProductId,
        customer_email: &str,
        customer_order_id: &str,
        settings: Option<CustomSettings>,
    ) -> Result<LicenseKey> {
        if customer_email.trim().is_empty() {
            return Err(Error::InvalidInput("customer email is required".to_string()));
        }
        if customer_order_id.trim().is_empty() {
            return Err(Error::InvalidInput("customer order id is required".to_string()));
        }

        let timeout = self.config.store_timeout();
        let product = bounded(timeout, "get_product", self.products.get(product_id))
            .await?
            .ok_or_else(|| Error::ProductNotFound(product_id.to_string()))?;

        let settings = settings.unwrap_or_default();
        let generator = KeyGenerator::new(self.prefix_for(&product, &settings))?;
        let created_at = Utc::now();
        let max_activations = settings
            .max_activations
            .unwrap_or_else(|| self.activation_limit(product.license_type));
        let expires_at = ExpirationPolicy::compute_expiry(
            created_at,
            settings.access_duration_days.or(product.access_duration_days),
        )?;

        for attempt in 1..=self.config.max_key_attempts {
            let license = LicenseKey {
                id: LicenseId::new(),
                product_id,
                customer_email: customer_email.trim().to_string(),
                customer_order_id: customer_order_id.to_string(),
                key_string: generator.generate(),
                status: LicenseStatus::Active,
                max_downloads: settings.max_downloads.unwrap_or(product.download_limit),
                download_count: 0,
                activations: DeviceBindings::new(max_activations),
                expires_at,
                last_accessed_at: None,
                created_at,
            };

            match bounded(timeout, "insert_license", self.licenses.insert(&license)).await {
                Ok(()) => {
                    info!(
                        license_id = %license.id,
                        product_id = %product_id,
                        key_prefix = license.key_hint(),
                        attempt,
                        "License issued"
                    );
                    return Ok(license);
                }
                Err(Error::DuplicateKey(_)) => {
                    warn!(attempt, product_id = %product_id, "License key collision, regenerating");
                }
                Err(e) => {
                    error!(product_id = %product_id, error = %e, "Failed to persist license");
                    return Err(e);
                }
            }
        }

        error!(
            product_id = %product_id,
            attempts = self.config.max_key_attempts,
            "Could not find a free license key"
        );
        Err(Error::KeyspaceExhausted {
            attempts: self.config.max_key_attempts,
        })
    }

    fn prefix_for(&self, product: &DigitalProduct, settings: &CustomSettings) -> String {
        settings
            .key_prefix
            .clone()
            .or_else(|| product.key_prefix.clone())
            .unwrap_or_else(|| self.config.key_prefix.clone())
    }

    fn activation_limit(&self, license_type: LicenseType) -> u32 {
        match license_type {
            LicenseType::Single => 1,
            LicenseType::Multi => self.config.multi_activation_limit,
            LicenseType::Unlimited => UNLIMITED_ACTIVATIONS,
        }
    }
}
