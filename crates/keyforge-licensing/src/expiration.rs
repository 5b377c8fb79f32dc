//! Expiry computation for time-boxed licenses.

use chrono::{DateTime, Duration, Utc};
use keyforge_core::{Error, Result};

/// Pure functions deciding when a license stops being usable.
pub struct ExpirationPolicy;

impl ExpirationPolicy {
    /// `created_at + access_duration_days`, or `None` for a perpetual license.
    ///
    /// Fails with `InvalidInput` when the sum falls outside the representable
    /// date range.
    pub fn compute_expiry(
        created_at: DateTime<Utc>,
        access_duration_days: Option<u32>,
    ) -> Result<Option<DateTime<Utc>>> {
        let Some(days) = access_duration_days else {
            return Ok(None);
        };
        created_at
            .checked_add_signed(Duration::days(i64::from(days)))
            .map(Some)
            .ok_or_else(|| Error::InvalidInput(format!("access duration of {} days is out of range", days)))
    }

    /// Whether the access window has closed at `now`.
    ///
    /// The expiry instant itself is still inside the window.
    pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        expires_at.is_some_and(|expires_at| now > expires_at)
    }
}
