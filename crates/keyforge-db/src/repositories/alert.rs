//! PostgreSQL implementation of AlertSink.

use async_trait::async_trait;
use keyforge_core::alert::{AlertSeverity, AlertType, PiracyAlert};
use keyforge_core::ids::{AlertId, LicenseId};
use keyforge_core::ports::AlertSink;
use keyforge_core::{Error, Result};
use sqlx::{PgPool, Row};

pub struct PgAlertRepository {
    pool: PgPool,
}

impl PgAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn severity_to_str(severity: &AlertSeverity) -> &'static str {
        match severity {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }

    fn str_to_severity(s: &str) -> AlertSeverity {
        match s {
            "low" => AlertSeverity::Low,
            "medium" => AlertSeverity::Medium,
            _ => AlertSeverity::High,
        }
    }

    fn row_to_alert(&self, r: &sqlx::postgres::PgRow) -> PiracyAlert {
        let severity: String = r.get("severity");
        PiracyAlert {
            id: AlertId::from_uuid(r.get::<uuid::Uuid, _>("id")),
            license_id: LicenseId::from_uuid(r.get::<uuid::Uuid, _>("license_id")),
            alert_type: AlertType::KeySharing,
            severity: Self::str_to_severity(&severity),
            details: r.get("details"),
            created_at: r.get("created_at"),
        }
    }

    /// Alerts raised against a license, newest first.
    pub async fn list_for_license(&self, license_id: LicenseId) -> Result<Vec<PiracyAlert>> {
        let rows = sqlx::query("SELECT id, license_id, alert_type, severity, details, created_at FROM piracy_alerts WHERE license_id = $1 ORDER BY created_at DESC")
            .bind(license_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.iter().map(|r| self.row_to_alert(r)).collect())
    }
}

#[async_trait]
impl AlertSink for PgAlertRepository {
    async fn record(&self, alert: &PiracyAlert) -> Result<()> {
        let alert_type = match alert.alert_type {
            AlertType::KeySharing => "key_sharing",
        };
        sqlx::query("INSERT INTO piracy_alerts (id, license_id, alert_type, severity, details, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(alert.id.as_uuid())
            .bind(alert.license_id.as_uuid())
            .bind(alert_type)
            .bind(Self::severity_to_str(&alert.severity))
            .bind(&alert.details)
            .bind(alert.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}
