//! Test context providing a migrated database.

use crate::containers::PostgresContainer;
use keyforge_db::Database;
use keyforge_licensing::{LicenseService, LicensingConfig};
use std::sync::Arc;

/// PostgreSQL container plus a migrated connection pool.
///
/// Drop this to stop the container.
pub struct TestContext {
    pub postgres: PostgresContainer,
    pub db: Database,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        crate::init_test_logging();

        let postgres = PostgresContainer::start().await?;
        let db = Database::connect(postgres.connection_string()).await?;
        db.migrate().await?;

        Ok(Self { postgres, db })
    }

    /// A licensing service wired to the PostgreSQL repositories.
    pub fn service(&self) -> LicenseService {
        self.service_with(LicensingConfig::default())
    }

    pub fn service_with(&self, config: LicensingConfig) -> LicenseService {
        LicenseService::new(
            Arc::new(self.db.licenses()),
            Arc::new(self.db.products()),
            Arc::new(self.db.alerts()),
            config,
        )
    }

    pub fn db_url(&self) -> &str {
        self.postgres.connection_string()
    }
}
