//! Integration test infrastructure for Keyforge.
//!
//! This crate provides testcontainers-based infrastructure for running the
//! licensing engine against a real PostgreSQL instance.
//!
//! # Usage
//!
//! ```ignore
//! use keyforge_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::new().await.unwrap();
//!     // Use ctx.db, ctx.service(), etc.
//! }
//! ```

pub mod containers;
pub mod context;
pub mod fixtures;

pub use context::TestContext;
pub use fixtures::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,keyforge_licensing=debug")),
        )
        .with_test_writer()
        .try_init();
}
