//! PostgreSQL implementation of ProductCatalog.

use super::{to_i32, to_u32};
use async_trait::async_trait;
use keyforge_core::ids::ProductId;
use keyforge_core::ports::ProductCatalog;
use keyforge_core::product::{DigitalProduct, LicenseType};
use keyforge_core::{Error, Result};
use sqlx::{PgPool, Row};

pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn license_type_to_str(license_type: &LicenseType) -> &'static str {
        match license_type {
            LicenseType::Single => "single",
            LicenseType::Multi => "multi",
            LicenseType::Unlimited => "unlimited",
        }
    }

    fn str_to_license_type(s: &str) -> LicenseType {
        match s {
            "multi" => LicenseType::Multi,
            "unlimited" => LicenseType::Unlimited,
            _ => LicenseType::Single,
        }
    }

    fn row_to_product(&self, r: &sqlx::postgres::PgRow) -> Result<DigitalProduct> {
        let license_type: String = r.get("license_type");
        Ok(DigitalProduct {
            id: ProductId::from_uuid(r.get::<uuid::Uuid, _>("id")),
            name: r.get("name"),
            download_limit: to_u32(r.get("download_limit"), "download_limit")?,
            license_type: Self::str_to_license_type(&license_type),
            access_duration_days: r
                .get::<Option<i32>, _>("access_duration_days")
                .map(|days| to_u32(days, "access_duration_days"))
                .transpose()?,
            requires_activation: r.get("requires_activation"),
            key_prefix: r.get("key_prefix"),
        })
    }

    /// Mirror a product from the commerce catalog.
    pub async fn upsert(&self, product: &DigitalProduct) -> Result<()> {
        let duration = product
            .access_duration_days
            .map(|days| to_i32(days, "access_duration_days"))
            .transpose()?;
        sqlx::query("INSERT INTO products (id, name, download_limit, license_type, access_duration_days, requires_activation, key_prefix) VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, download_limit = EXCLUDED.download_limit, license_type = EXCLUDED.license_type, access_duration_days = EXCLUDED.access_duration_days, requires_activation = EXCLUDED.requires_activation, key_prefix = EXCLUDED.key_prefix, updated_at = NOW()")
            .bind(product.id.as_uuid())
            .bind(&product.name)
            .bind(to_i32(product.download_limit, "download_limit")?)
            .bind(Self::license_type_to_str(&product.license_type))
            .bind(duration)
            .bind(product.requires_activation)
            .bind(&product.key_prefix)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<DigitalProduct>> {
        let rows = sqlx::query("SELECT id, name, download_limit, license_type, access_duration_days, requires_activation, key_prefix FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.iter().map(|r| self.row_to_product(r)).collect()
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn get(&self, id: ProductId) -> Result<Option<DigitalProduct>> {
        let row = sqlx::query("SELECT id, name, download_limit, license_type, access_duration_days, requires_activation, key_prefix FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(|r| self.row_to_product(&r)).transpose()
    }
}
