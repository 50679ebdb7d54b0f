//! Core data models for the matching pipeline.

pub mod cell;
pub mod point;
pub mod table;

pub use cell::GridCell;
pub use point::PostcodePoint;
pub use table::{CellValue, Table};
