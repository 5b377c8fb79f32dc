//! Digital product types, as seen from the licensing core.

use crate::ids::ProductId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A product sold through the catalog. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DigitalProduct {
    pub id: ProductId,
    pub name: String,
    pub download_limit: u32,
    pub license_type: LicenseType,
    /// `None` means perpetual access.
    pub access_duration_days: Option<u32>,
    pub requires_activation: bool,
    /// Prefix for keys issued against this product.
    #[serde(default)]
    pub key_prefix: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LicenseType {
    Single,
    Multi,
    Unlimited,
}
