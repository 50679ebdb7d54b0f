//! Point-in-Polygon (PIP) grid matching.
//!
//! Assigns each postcode point to the grid cell containing it, using an
//! R-tree spatial index over the cells.

mod index;
mod matcher;
mod summary;

pub use index::GridSpatialIndex;
pub use matcher::{match_postcodes_to_grid, GridMatcher, MatchRow, MatchTable};
pub use summary::{summarize_matches, MatchSummary};
