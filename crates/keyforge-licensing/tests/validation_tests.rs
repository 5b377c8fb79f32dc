//! End-to-end validation behaviour against the in-memory store.

mod common;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{product, service_with};
use keyforge_core::alert::{AlertSeverity, AlertType, PiracyAlert};
use keyforge_core::license::LicenseStatus;
use keyforge_core::ports::{AlertSink, LicenseRepository};
use keyforge_core::product::LicenseType;
use keyforge_core::validation::InvalidReason;
use keyforge_core::{Error, Result};
use keyforge_db::MemoryStore;
use keyforge_licensing::{CustomSettings, LicenseService, LicensingConfig};
use std::sync::Arc;

fn single_device() -> CustomSettings {
    CustomSettings {
        max_activations: Some(1),
        max_downloads: Some(5),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_second_device_is_rejected_and_alerted() {
    let product = product(LicenseType::Single, true);
    let (store, service) = service_with(&product);
    let license = service
        .generate(product.id, "buyer@example.com", "order-a", Some(single_device()))
        .await
        .unwrap();

    let first = service.validate(&license.key_string, "device-A").await;
    assert!(first.valid);
    assert_eq!(first.activations_remaining, Some(0));
    assert_eq!(first.downloads_remaining, Some(5));
    assert_eq!(first.product_name.as_deref(), Some("Studio Presets"));

    let second = service.validate(&license.key_string, "device-B").await;
    assert!(!second.valid);
    assert_eq!(second.reason, Some(InvalidReason::ActivationLimitExceeded));

    let alerts = store.alerts_for(license.id);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::KeySharing);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
    assert_eq!(alerts[0].details["fingerprint"], "device-B");
    assert_eq!(alerts[0].details["activation_count"], 1);
}

#[tokio::test]
async fn test_same_device_revalidates_without_consuming_quota() {
    let product = product(LicenseType::Multi, true);
    let (store, service) = service_with(&product);
    let license = service
        .generate(product.id, "buyer@example.com", "order-b", None)
        .await
        .unwrap();

    let first = service.validate(&license.key_string, "device-A").await;
    let second = service.validate(&license.key_string, "device-A").await;
    let third = service.validate(&license.key_string, "device-A").await;

    assert!(first.valid && second.valid && third.valid);
    assert_eq!(first.activations_remaining, Some(4));
    assert_eq!(second.activations_remaining, first.activations_remaining);
    assert_eq!(third.activations_remaining, first.activations_remaining);

    let stored = store.get_by_key(&license.key_string).await.unwrap().unwrap();
    assert_eq!(stored.activation_count(), 1);
    assert!(stored.last_accessed_at.is_some());
    assert!(store.alerts().is_empty());
}

#[tokio::test]
async fn test_zero_day_license_expires_on_first_use() {
    let mut product = product(LicenseType::Single, true);
    product.access_duration_days = Some(0);
    let (store, service) = service_with(&product);
    let license = service
        .generate(product.id, "buyer@example.com", "order-c", None)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;

    let result = service.validate(&license.key_string, "device-A").await;
    assert!(!result.valid);
    assert_eq!(result.reason, Some(InvalidReason::Expired));

    let stored = store.get_by_key(&license.key_string).await.unwrap().unwrap();
    assert_eq!(stored.status, LicenseStatus::Expired);
    assert_eq!(stored.activation_count(), 0);
}

#[tokio::test]
async fn test_persisted_expiry_is_not_rederived() {
    let product = product(LicenseType::Single, true);
    let (store, service) = service_with(&product);
    let mut license = service
        .generate(product.id, "buyer@example.com", "order-d", None)
        .await
        .unwrap();

    license.expires_at = Some(Utc::now() - Duration::days(1));
    store.replace(license.clone()).unwrap();

    let first = service.validate(&license.key_string, "device-A").await;
    assert_eq!(first.reason, Some(InvalidReason::Expired));
    assert_eq!(
        store.get_by_key(&license.key_string).await.unwrap().unwrap().status,
        LicenseStatus::Expired
    );

    // Push the expiry into the future: the persisted status still wins.
    let mut stored = store.get_by_key(&license.key_string).await.unwrap().unwrap();
    stored.expires_at = Some(Utc::now() + Duration::days(30));
    store.replace(stored).unwrap();

    let second = service.validate(&license.key_string, "device-A").await;
    assert!(!second.valid);
    assert_eq!(second.reason, Some(InvalidReason::Expired));
}

#[tokio::test]
async fn test_unknown_key() {
    let product = product(LicenseType::Single, true);
    let (_store, service) = service_with(&product);

    let result = service.validate("LIC-AAAA-BBBB-CCCC-DDDD", "device-A").await;
    assert!(!result.valid);
    assert_eq!(result.reason, Some(InvalidReason::NotFound));
}

#[tokio::test]
async fn test_administrative_statuses_are_respected() {
    let product = product(LicenseType::Multi, true);
    let (store, service) = service_with(&product);

    for (status, reason) in [
        (LicenseStatus::Revoked, InvalidReason::Revoked),
        (LicenseStatus::Suspended, InvalidReason::Suspended),
    ] {
        let license = service
            .generate(product.id, "buyer@example.com", "order-e", None)
            .await
            .unwrap();
        store.set_status(license.id, status).unwrap();

        let result = service.validate(&license.key_string, "device-A").await;
        assert_eq!(result.reason, Some(reason));

        let stored = store.get_by_key(&license.key_string).await.unwrap().unwrap();
        assert_eq!(stored.status, status);
        assert_eq!(stored.activation_count(), 0);
    }
}

#[tokio::test]
async fn test_products_without_activation_skip_binding() {
    let product = product(LicenseType::Single, false);
    let (store, service) = service_with(&product);
    let license = service
        .generate(product.id, "buyer@example.com", "order-f", None)
        .await
        .unwrap();

    for device in ["device-A", "device-B", "device-C"] {
        let result = service.validate(&license.key_string, device).await;
        assert!(result.valid);
        assert_eq!(result.activations_remaining, Some(1));
    }
    assert!(store.alerts().is_empty());
}

struct BrokenSink;

#[async_trait]
impl AlertSink for BrokenSink {
    async fn record(&self, _alert: &PiracyAlert) -> Result<()> {
        Err(Error::Database("connection reset".to_string()))
    }
}

#[tokio::test]
async fn test_alert_failure_does_not_change_rejection() {
    common::init_test_logging();
    let product = product(LicenseType::Single, true);
    let store = Arc::new(MemoryStore::new());
    store.put_product(product.clone());
    let service = LicenseService::new(
        store.clone(),
        store.clone(),
        Arc::new(BrokenSink),
        LicensingConfig::default(),
    );
    let license = service
        .generate(product.id, "buyer@example.com", "order-g", None)
        .await
        .unwrap();

    assert!(service.validate(&license.key_string, "device-A").await.valid);
    let rejected = service.validate(&license.key_string, "device-B").await;
    assert!(!rejected.valid);
    assert_eq!(rejected.reason, Some(InvalidReason::ActivationLimitExceeded));
}

#[tokio::test]
async fn test_downloads_stop_at_quota() {
    let product = product(LicenseType::Single, true);
    let (_store, service) = service_with(&product);
    let license = service
        .generate(
            product.id,
            "buyer@example.com",
            "order-h",
            Some(CustomSettings {
                max_downloads: Some(2),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

    let first = service.record_download(&license.key_string).await;
    assert!(first.allowed);
    assert_eq!(first.downloads_remaining, Some(1));
    assert!(service.record_download(&license.key_string).await.allowed);

    let third = service.record_download(&license.key_string).await;
    assert!(!third.allowed);
    assert_eq!(third.reason, Some(InvalidReason::DownloadLimitExceeded));

    let validation = service.validate(&license.key_string, "device-A").await;
    assert_eq!(validation.downloads_remaining, Some(0));
}

#[tokio::test]
async fn test_downloads_refused_for_expired_license() {
    let mut product = product(LicenseType::Single, true);
    product.access_duration_days = Some(0);
    let (store, service) = service_with(&product);
    let license = service
        .generate(product.id, "buyer@example.com", "order-i", None)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;

    let result = service.record_download(&license.key_string).await;
    assert!(!result.allowed);
    assert_eq!(result.reason, Some(InvalidReason::Expired));
    let stored = store.get_by_key(&license.key_string).await.unwrap().unwrap();
    assert_eq!(stored.download_count, 0);
    assert_eq!(stored.status, LicenseStatus::Expired);
}

#[tokio::test]
async fn test_lookup_has_no_side_effects() {
    let product = product(LicenseType::Single, true);
    let (_store, service) = service_with(&product);
    let license = service
        .generate(product.id, "buyer@example.com", "order-j", None)
        .await
        .unwrap();

    let found = service.lookup(&license.key_string).await.unwrap().unwrap();
    assert_eq!(found, license);
    assert!(service.lookup("LIC-NOPE-NOPE-NOPE-NOPE").await.unwrap().is_none());
}
