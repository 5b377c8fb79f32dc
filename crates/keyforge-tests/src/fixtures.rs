//! Test fixtures for creating sample data.

use keyforge_core::ids::ProductId;
use keyforge_core::product::{DigitalProduct, LicenseType};

/// Factory for catalog products.
pub struct ProductFixture;

impl ProductFixture {
    /// Single-device product with five downloads and no expiry.
    pub fn single_device() -> DigitalProduct {
        DigitalProduct {
            id: ProductId::new(),
            name: "Field Recorder Pro".to_string(),
            download_limit: 5,
            license_type: LicenseType::Single,
            access_duration_days: None,
            requires_activation: true,
            key_prefix: Some("FRP".to_string()),
        }
    }

    /// Trial product whose access window is already closed at issuance.
    pub fn expired_trial() -> DigitalProduct {
        DigitalProduct {
            name: "Field Recorder Trial".to_string(),
            access_duration_days: Some(0),
            key_prefix: None,
            ..Self::single_device()
        }
    }

    /// Multi-device product.
    pub fn team() -> DigitalProduct {
        DigitalProduct {
            name: "Field Recorder Team".to_string(),
            license_type: LicenseType::Multi,
            ..Self::single_device()
        }
    }
}
