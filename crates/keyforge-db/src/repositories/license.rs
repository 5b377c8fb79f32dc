//! PostgreSQL implementation of LicenseRepository.

use super::{to_i32, to_u32};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyforge_core::ids::{LicenseId, ProductId};
use keyforge_core::license::{DeviceBindings, LicenseKey, LicenseStatus};
use keyforge_core::ports::{BindOutcome, DownloadOutcome, LicenseRepository};
use keyforge_core::{Error, Result};
use sqlx::{PgPool, Row};
use tracing::debug;

const LICENSE_COLUMNS: &str = "id, product_id, customer_email, customer_order_id, key_string, status, max_downloads, download_count, max_activations, activation_count, bound_devices, expires_at, last_accessed_at, created_at";

const KEY_STRING_CONSTRAINT: &str = "licenses_key_string_key";

pub struct PgLicenseRepository {
    pool: PgPool,
}

impl PgLicenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn status_to_str(status: &LicenseStatus) -> &'static str {
        match status {
            LicenseStatus::Active => "active",
            LicenseStatus::Expired => "expired",
            LicenseStatus::Revoked => "revoked",
            LicenseStatus::Suspended => "suspended",
        }
    }

    fn str_to_status(s: &str) -> Result<LicenseStatus> {
        match s {
            "active" => Ok(LicenseStatus::Active),
            "expired" => Ok(LicenseStatus::Expired),
            "revoked" => Ok(LicenseStatus::Revoked),
            "suspended" => Ok(LicenseStatus::Suspended),
            other => Err(Error::Internal(format!("unknown license status: {}", other))),
        }
    }

    fn row_to_license(&self, r: &sqlx::postgres::PgRow) -> Result<LicenseKey> {
        let status_str: String = r.get("status");
        let devices: Vec<String> = r.get("bound_devices");
        let activation_count = to_u32(r.get("activation_count"), "activation_count")?;
        let activations = DeviceBindings::from_parts(
            to_u32(r.get("max_activations"), "max_activations")?,
            devices,
        );
        if activations.activation_count() != activation_count {
            return Err(Error::Internal(format!(
                "activation count {} does not match {} bound devices",
                activation_count,
                activations.activation_count()
            )));
        }

        Ok(LicenseKey {
            id: LicenseId::from_uuid(r.get::<uuid::Uuid, _>("id")),
            product_id: ProductId::from_uuid(r.get::<uuid::Uuid, _>("product_id")),
            customer_email: r.get("customer_email"),
            customer_order_id: r.get("customer_order_id"),
            key_string: r.get("key_string"),
            status: Self::str_to_status(&status_str)?,
            max_downloads: to_u32(r.get("max_downloads"), "max_downloads")?,
            download_count: to_u32(r.get("download_count"), "download_count")?,
            activations,
            expires_at: r.get("expires_at"),
            last_accessed_at: r.get("last_accessed_at"),
            created_at: r.get("created_at"),
        })
    }

    async fn require(&self, id: LicenseId) -> Result<LicenseKey> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::LicenseNotFound(id.to_string()))
    }
}

#[async_trait]
impl LicenseRepository for PgLicenseRepository {
    async fn insert(&self, license: &LicenseKey) -> Result<()> {
        let devices: Vec<String> = license.activations.devices().map(str::to_string).collect();
        sqlx::query("INSERT INTO licenses (id, product_id, customer_email, customer_order_id, key_string, status, max_downloads, download_count, max_activations, activation_count, bound_devices, expires_at, last_accessed_at, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)")
            .bind(license.id.as_uuid())
            .bind(license.product_id.as_uuid())
            .bind(&license.customer_email)
            .bind(&license.customer_order_id)
            .bind(&license.key_string)
            .bind(Self::status_to_str(&license.status))
            .bind(to_i32(license.max_downloads, "max_downloads")?)
            .bind(to_i32(license.download_count, "download_count")?)
            .bind(to_i32(license.max_activations(), "max_activations")?)
            .bind(to_i32(license.activation_count(), "activation_count")?)
            .bind(&devices)
            .bind(license.expires_at)
            .bind(license.last_accessed_at)
            .bind(license.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.constraint() == Some(KEY_STRING_CONSTRAINT) => {
                    Error::DuplicateKey(license.key_hint().to_string())
                }
                _ => Error::Database(e.to_string()),
            })?;
        Ok(())
    }

    async fn get(&self, id: LicenseId) -> Result<Option<LicenseKey>> {
        let row = sqlx::query(&format!("SELECT {} FROM licenses WHERE id = $1", LICENSE_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(|r| self.row_to_license(&r)).transpose()
    }

    async fn get_by_key(&self, key_string: &str) -> Result<Option<LicenseKey>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM licenses WHERE key_string = $1",
            LICENSE_COLUMNS
        ))
        .bind(key_string)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        row.map(|r| self.row_to_license(&r)).transpose()
    }

    async fn bind_device(
        &self,
        id: LicenseId,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<BindOutcome> {
        // Concurrent updates of the same row serialize on its row lock, and
        // the WHERE clause is re-checked against the committed version.
        let row = sqlx::query(&format!(
            "UPDATE licenses SET bound_devices = array_append(bound_devices, $2::text), activation_count = activation_count + 1, last_accessed_at = $3, updated_at = NOW() WHERE id = $1 AND status = 'active' AND activation_count < max_activations AND NOT ($2::text = ANY(bound_devices)) RETURNING {}",
            LICENSE_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(fingerprint)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        if let Some(r) = row {
            return Ok(BindOutcome::Bound(self.row_to_license(&r)?));
        }

        let current = self.require(id).await?;
        debug!(license_id = %id, status = ?current.status, "Conditional bind matched no row");
        if !current.status.is_active() {
            Ok(BindOutcome::NotActive(current))
        } else if current.is_bound_to(fingerprint) {
            Ok(BindOutcome::AlreadyBound(current))
        } else {
            Ok(BindOutcome::LimitReached(current))
        }
    }

    async fn increment_downloads(
        &self,
        id: LicenseId,
        now: DateTime<Utc>,
    ) -> Result<DownloadOutcome> {
        let row = sqlx::query(&format!(
            "UPDATE licenses SET download_count = download_count + 1, last_accessed_at = $2, updated_at = NOW() WHERE id = $1 AND download_count < max_downloads RETURNING {}",
            LICENSE_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(DownloadOutcome::Recorded(self.row_to_license(&r)?)),
            None => Ok(DownloadOutcome::LimitReached(self.require(id).await?)),
        }
    }

    async fn mark_expired(&self, id: LicenseId) -> Result<()> {
        sqlx::query(
            "UPDATE licenses SET status = 'expired', updated_at = NOW() WHERE id = $1 AND status = 'active'",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn touch(&self, id: LicenseId, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE licenses SET last_accessed_at = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}
