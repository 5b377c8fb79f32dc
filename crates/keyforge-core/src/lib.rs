//! Keyforge Core
//!
//! Core domain types, port traits, and error handling for Keyforge.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used by the licensing engine and its storage adapters.

pub mod alert;
pub mod error;
pub mod ids;
pub mod license;
pub mod ports;
pub mod product;
pub mod validation;

pub use error::{Error, Result};
pub use ids::*;
