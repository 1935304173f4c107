//! Data layer for the harvest dashboard.
//!
//! Reads sheet exports into raw rows and aggregates the normalized harvest
//! records by date, section and worker.

pub mod aggregator;
pub mod reader;

pub use harvest_core as core;
