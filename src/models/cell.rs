//! Grid cell model.

use geo::{BoundingRect, Polygon};

/// A single fixed-size square cell of the projected grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    /// Stable identifier (source id column, or "<X>_<Y>" from the center)
    pub id: String,
    pub center_x: f64,
    pub center_y: f64,
    /// Closed square ring centered on (center_x, center_y)
    pub geometry: Polygon<f64>,
    /// Index of the grid-source row this cell was built from
    pub row: usize,
}

impl GridCell {
    /// Get the bounding box of this cell
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}
