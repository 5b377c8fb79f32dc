//! Activation quota under concurrent validation.

mod common;

use common::{product, service_with};
use keyforge_core::ports::LicenseRepository;
use keyforge_core::product::LicenseType;
use keyforge_core::validation::InvalidReason;
use keyforge_licensing::CustomSettings;
use std::sync::Arc;

const CALLERS: usize = 32;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_exactly_one_device_wins_single_slot() {
    let product = product(LicenseType::Single, true);
    let (store, service) = service_with(&product);
    let service = Arc::new(service);
    let license = service
        .generate(
            product.id,
            "buyer@example.com",
            "order-race",
            Some(CustomSettings {
                max_activations: Some(1),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

    let tasks: Vec<_> = (0..CALLERS)
        .map(|i| {
            let service = service.clone();
            let key = license.key_string.clone();
            tokio::spawn(async move { service.validate(&key, &format!("device-{}", i)).await })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let accepted = results.iter().filter(|r| r.valid).count();
    let rejected = results
        .iter()
        .filter(|r| r.reason == Some(InvalidReason::ActivationLimitExceeded))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(rejected, CALLERS - 1);

    let stored = store.get_by_key(&license.key_string).await.unwrap().unwrap();
    assert_eq!(stored.activation_count(), 1);
    assert_eq!(store.alerts_for(license.id).len(), CALLERS - 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_same_device_racing_binds_once() {
    let product = product(LicenseType::Multi, true);
    let (store, service) = service_with(&product);
    let service = Arc::new(service);
    let license = service
        .generate(product.id, "buyer@example.com", "order-same", None)
        .await
        .unwrap();

    let tasks: Vec<_> = (0..CALLERS)
        .map(|_| {
            let service = service.clone();
            let key = license.key_string.clone();
            tokio::spawn(async move { service.validate(&key, "device-A").await })
        })
        .collect();

    for joined in futures::future::join_all(tasks).await {
        assert!(joined.unwrap().valid);
    }

    let stored = store.get_by_key(&license.key_string).await.unwrap().unwrap();
    assert_eq!(stored.activation_count(), 1);
    assert!(store.alerts().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_downloads_never_exceed_quota() {
    let product = product(LicenseType::Single, false);
    let (store, service) = service_with(&product);
    let service = Arc::new(service);
    let license = service
        .generate(product.id, "buyer@example.com", "order-dl", None)
        .await
        .unwrap();

    let tasks: Vec<_> = (0..CALLERS)
        .map(|_| {
            let service = service.clone();
            let key = license.key_string.clone();
            tokio::spawn(async move { service.record_download(&key).await })
        })
        .collect();

    let allowed = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter(|joined| joined.as_ref().is_ok_and(|r| r.allowed))
        .count();

    assert_eq!(allowed, 5);
    let stored = store.get_by_key(&license.key_string).await.unwrap().unwrap();
    assert_eq!(stored.download_count, 5);
}
