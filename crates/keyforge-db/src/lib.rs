//! Storage adapters for Keyforge.
//!
//! `repositories` holds the PostgreSQL implementations of the core ports;
//! `memory` holds an in-process store with the same atomicity guarantees,
//! used by tests and local tooling.

pub mod memory;
pub mod repositories;

pub use memory::MemoryStore;
pub use repositories::*;

use keyforge_core::Result;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Database connection pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| keyforge_core::Error::Database(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| keyforge_core::Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn licenses(&self) -> PgLicenseRepository {
        PgLicenseRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> PgProductCatalog {
        PgProductCatalog::new(self.pool.clone())
    }

    pub fn alerts(&self) -> PgAlertRepository {
        PgAlertRepository::new(self.pool.clone())
    }
}
