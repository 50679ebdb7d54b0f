//! AirLock - links postcode points to the 1 km grid cells containing them
//!
//! This library provides the grid construction and spatial matching engine
//! used by the `airlock` binary.

pub mod config;
pub mod crs;
pub mod error;
pub mod export;
pub mod filters;
pub mod grid;
pub mod models;
pub mod pip;
pub mod pipeline;
pub mod postcodes;
pub mod validation;

pub use config::AirlockConfig;
pub use error::{AirlockError, Result};
pub use models::{CellValue, GridCell, PostcodePoint, Table};
