//! Repository implementations for PostgreSQL.

mod alert;
mod license;
mod product;

pub use alert::PgAlertRepository;
pub use license::PgLicenseRepository;
pub use product::PgProductCatalog;

use keyforge_core::{Error, Result};

/// Read a non-negative INTEGER column into a `u32`.
fn to_u32(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Internal(format!("negative value in {}: {}", column, value)))
}

/// Bind a `u32` into an INTEGER column.
fn to_i32(value: u32, column: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidInput(format!("{} out of range: {}", column, value)))
}
