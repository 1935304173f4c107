//! Shared building blocks for the harvest dashboard.
//!
//! Models for raw spreadsheet cells and normalized harvest entries, the date
//! and quantity normalizers, CLI settings, number formatting and the common
//! error type.

pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod quantity;
pub mod settings;

pub use error::{HarvestError, Result};
