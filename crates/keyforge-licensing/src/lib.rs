//! License issuance and validation for Keyforge.
//!
//! The [`LicenseIssuer`] creates keys at purchase time; the [`Validator`]
//! is consulted on every use of the licensed product and drives the
//! license state machine through [`ExpirationPolicy`], [`ActivationTracker`]
//! and [`PiracyDetector`].

pub mod activation;
pub mod config;
pub mod downloads;
pub mod expiration;
pub mod issuer;
pub mod keygen;
pub mod piracy;
pub mod service;
pub mod validator;

pub use activation::{ActivationOutcome, ActivationTracker, RejectReason};
pub use config::LicensingConfig;
pub use downloads::DownloadTracker;
pub use expiration::ExpirationPolicy;
pub use issuer::{CustomSettings, LicenseIssuer};
pub use keygen::{KEY_ALPHABET, KeyGenerator};
pub use piracy::PiracyDetector;
pub use service::LicenseService;
pub use validator::Validator;

use keyforge_core::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Run a store call under a deadline. Elapsed deadlines become
/// [`Error::Timeout`] so callers can treat them like any other store failure.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation,
            millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
