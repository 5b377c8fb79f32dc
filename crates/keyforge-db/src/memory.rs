//! In-process implementation of the storage ports.
//!
//! Every conditional update runs under a single lock acquisition, which
//! gives the same check-and-mutate atomicity the PostgreSQL adapter gets
//! from row locks. Locks are never held across an `.await`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyforge_core::alert::PiracyAlert;
use keyforge_core::ids::{LicenseId, ProductId};
use keyforge_core::license::{BindAttempt, LicenseKey, LicenseStatus};
use keyforge_core::ports::{AlertSink, BindOutcome, DownloadOutcome, LicenseRepository, ProductCatalog};
use keyforge_core::product::DigitalProduct;
use keyforge_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct LicenseTable {
    by_id: HashMap<LicenseId, LicenseKey>,
    by_key: HashMap<String, LicenseId>,
}

/// Licenses, products and alerts held in memory.
#[derive(Default)]
pub struct MemoryStore {
    licenses: Mutex<LicenseTable>,
    products: Mutex<HashMap<ProductId, DigitalProduct>>,
    alerts: Mutex<Vec<PiracyAlert>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a catalog product.
    pub fn put_product(&self, product: DigitalProduct) {
        lock(&self.products).insert(product.id, product);
    }

    /// Force a license into `status`, as administrative tooling would.
    pub fn set_status(&self, id: LicenseId, status: LicenseStatus) -> Result<()> {
        let mut table = lock(&self.licenses);
        let license = table
            .by_id
            .get_mut(&id)
            .ok_or_else(|| Error::LicenseNotFound(id.to_string()))?;
        license.status = status;
        Ok(())
    }

    /// Overwrite a stored license wholesale.
    pub fn replace(&self, license: LicenseKey) -> Result<()> {
        let mut table = lock(&self.licenses);
        match table.by_id.get_mut(&license.id) {
            Some(slot) if slot.key_string == license.key_string => {
                *slot = license;
                Ok(())
            }
            Some(_) => Err(Error::InvalidInput("key string cannot change".to_string())),
            None => Err(Error::LicenseNotFound(license.id.to_string())),
        }
    }

    pub fn license_count(&self) -> usize {
        lock(&self.licenses).by_id.len()
    }

    pub fn alerts(&self) -> Vec<PiracyAlert> {
        lock(&self.alerts).clone()
    }

    pub fn alerts_for(&self, license_id: LicenseId) -> Vec<PiracyAlert> {
        lock(&self.alerts)
            .iter()
            .filter(|alert| alert.license_id == license_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LicenseRepository for MemoryStore {
    async fn insert(&self, license: &LicenseKey) -> Result<()> {
        let mut table = lock(&self.licenses);
        if table.by_key.contains_key(&license.key_string) {
            return Err(Error::DuplicateKey(license.key_hint().to_string()));
        }
        if table.by_id.contains_key(&license.id) {
            return Err(Error::Database(format!("duplicate license id {}", license.id)));
        }
        table.by_key.insert(license.key_string.clone(), license.id);
        table.by_id.insert(license.id, license.clone());
        Ok(())
    }

    async fn get(&self, id: LicenseId) -> Result<Option<LicenseKey>> {
        Ok(lock(&self.licenses).by_id.get(&id).cloned())
    }

    async fn get_by_key(&self, key_string: &str) -> Result<Option<LicenseKey>> {
        let table = lock(&self.licenses);
        Ok(table
            .by_key
            .get(key_string)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn bind_device(
        &self,
        id: LicenseId,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome> {
        let mut table = lock(&self.licenses);
        let license = table
            .by_id
            .get_mut(&id)
            .ok_or_else(|| Error::LicenseNotFound(id.to_string()))?;

        if !license.status.is_active() {
            return Ok(BindOutcome::NotActive(license.clone()));
        }

        Ok(match license.activations.try_bind(fingerprint) {
            BindAttempt::Bound => {
                license.last_accessed_at = Some(now);
                BindOutcome::Bound(license.clone())
            }
            BindAttempt::AlreadyBound => BindOutcome::AlreadyBound(license.clone()),
            BindAttempt::Full => BindOutcome::LimitReached(license.clone()),
        })
    }

    async fn increment_downloads(
        &self,
        id: LicenseId,
        now: DateTime<Utc>,
    ) -> Result<DownloadOutcome> {
        let mut table = lock(&self.licenses);
        let license = table
            .by_id
            .get_mut(&id)
            .ok_or_else(|| Error::LicenseNotFound(id.to_string()))?;

        if license.download_count >= license.max_downloads {
            return Ok(DownloadOutcome::LimitReached(license.clone()));
        }
        license.download_count += 1;
        license.last_accessed_at = Some(now);
        Ok(DownloadOutcome::Recorded(license.clone()))
    }

    async fn mark_expired(&self, id: LicenseId) -> Result<()> {
        let mut table = lock(&self.licenses);
        if let Some(license) = table.by_id.get_mut(&id)
            && license.status == LicenseStatus::Active
        {
            license.status = LicenseStatus::Expired;
        }
        Ok(())
    }

    async fn touch(&self, id: LicenseId, now: DateTime<Utc>) -> Result<()> {
        let mut table = lock(&self.licenses);
        if let Some(license) = table.by_id.get_mut(&id) {
            license.last_accessed_at = Some(now);
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for MemoryStore {
    async fn get(&self, id: ProductId) -> Result<Option<DigitalProduct>> {
        Ok(lock(&self.products).get(&id).cloned())
    }
}

#[async_trait]
impl AlertSink for MemoryStore {
    async fn record(&self, alert: &PiracyAlert) -> Result<()> {
        lock(&self.alerts).push(alert.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyforge_core::license::DeviceBindings;
    use std::sync::Arc;

    fn license(key: &str, max_activations: u32, max_downloads: u32) -> LicenseKey {
        LicenseKey {
            id: LicenseId::new(),
            product_id: ProductId::new(),
            customer_email: "buyer@example.com".to_string(),
            customer_order_id: "order-1".to_string(),
            key_string: key.to_string(),
            status: LicenseStatus::Active,
            max_downloads,
            download_count: 0,
            activations: DeviceBindings::new(max_activations),
            expires_at: None,
            last_accessed_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected_without_partial_row() {
        let store = MemoryStore::new();
        store.insert(&license("LIC-AAAA-AAAA-AAAA-AAAA", 1, 1)).await.unwrap();

        let err = store
            .insert(&license("LIC-AAAA-AAAA-AAAA-AAAA", 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));
        assert_eq!(store.license_count(), 1);
    }

    #[tokio::test]
    async fn test_bind_outcomes() {
        let store = MemoryStore::new();
        let lic = license("LIC-BBBB-BBBB-BBBB-BBBB", 1, 1);
        store.insert(&lic).await.unwrap();
        let now = Utc::now();

        assert!(matches!(store.bind_device(lic.id, "a", now).await.unwrap(), BindOutcome::Bound(_)));
        assert!(matches!(
            store.bind_device(lic.id, "a", now).await.unwrap(),
            BindOutcome::AlreadyBound(_)
        ));
        assert!(matches!(
            store.bind_device(lic.id, "b", now).await.unwrap(),
            BindOutcome::LimitReached(_)
        ));

        store.set_status(lic.id, LicenseStatus::Revoked).unwrap();
        assert!(matches!(
            store.bind_device(lic.id, "a", now).await.unwrap(),
            BindOutcome::NotActive(_)
        ));
    }

    #[tokio::test]
    async fn test_download_quota() {
        let store = MemoryStore::new();
        let lic = license("LIC-CCCC-CCCC-CCCC-CCCC", 1, 2);
        store.insert(&lic).await.unwrap();
        let now = Utc::now();

        assert!(matches!(store.increment_downloads(lic.id, now).await.unwrap(), DownloadOutcome::Recorded(_)));
        assert!(matches!(store.increment_downloads(lic.id, now).await.unwrap(), DownloadOutcome::Recorded(_)));
        match store.increment_downloads(lic.id, now).await.unwrap() {
            DownloadOutcome::LimitReached(current) => assert_eq!(current.download_count, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mark_expired_only_moves_active() {
        let store = MemoryStore::new();
        let lic = license("LIC-DDDD-DDDD-DDDD-DDDD", 1, 1);
        store.insert(&lic).await.unwrap();

        store.mark_expired(lic.id).await.unwrap();
        store.mark_expired(lic.id).await.unwrap();
        assert_eq!(LicenseRepository::get(&store, lic.id).await.unwrap().unwrap().status, LicenseStatus::Expired);

        let revoked = license("LIC-EEEE-EEEE-EEEE-EEEE", 1, 1);
        store.insert(&revoked).await.unwrap();
        store.set_status(revoked.id, LicenseStatus::Revoked).unwrap();
        store.mark_expired(revoked.id).await.unwrap();
        assert_eq!(LicenseRepository::get(&store, revoked.id).await.unwrap().unwrap().status, LicenseStatus::Revoked);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_binds_respect_quota() {
        let store = Arc::new(MemoryStore::new());
        let lic = license("LIC-FFFF-FFFF-FFFF-FFFF", 3, 1);
        store.insert(&lic).await.unwrap();

        let id = lic.id;
        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .bind_device(id, &format!("device-{}", i), Utc::now())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut bound = 0;
        for outcome in futures::future::join_all(tasks).await {
            if matches!(outcome.unwrap(), BindOutcome::Bound(_)) {
                bound += 1;
            }
        }

        assert_eq!(bound, 3);
        let stored = LicenseRepository::get(store.as_ref(), lic.id).await.unwrap().unwrap();
        assert_eq!(stored.activation_count(), 3);
    }
}
