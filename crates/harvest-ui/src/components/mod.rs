pub mod header;
pub mod indicators;
pub mod quantity_bar;
