//! Terminal UI layer for the harvest dashboard.
//!
//! Provides themes, header and status components, the per-section day
//! tables, the month/year bar charts and the main application event loop,
//! built on [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod components;
pub mod table_view;
pub mod themes;

pub use harvest_core as core;
