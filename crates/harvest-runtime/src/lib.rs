//! Runtime layer for the harvest dashboard.
//!
//! Owns the TTL-cached data fetch, turns aggregated snapshots into dashboard
//! payloads and drives the background refresh loop.

pub mod dashboard;
pub mod data_manager;
pub mod orchestrator;

pub use harvest_core as core;
pub use harvest_data as data;
