//! Shared fixtures for licensing tests.

#![allow(dead_code)]

use keyforge_core::ids::ProductId;
use keyforge_core::product::{DigitalProduct, LicenseType};
use keyforge_db::MemoryStore;
use keyforge_licensing::{LicenseService, LicensingConfig};
use std::sync::Arc;

/// Initialize test logging (safe to call from every test).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,keyforge_licensing=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub fn product(license_type: LicenseType, requires_activation: bool) -> DigitalProduct {
    DigitalProduct {
        id: ProductId::new(),
        name: "Studio Presets".to_string(),
        download_limit: 5,
        license_type,
        access_duration_days: None,
        requires_activation,
        key_prefix: None,
    }
}

/// A service over a fresh in-memory store seeded with `product`.
pub fn service_with(product: &DigitalProduct) -> (Arc<MemoryStore>, LicenseService) {
    init_test_logging();
    let store = Arc::new(MemoryStore::new());
    store.put_product(product.clone());
    let service = LicenseService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        LicensingConfig::default(),
    );
    (store, service)
}
