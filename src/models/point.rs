//! Postcode point model.

use geo::Point;

/// A postcode location in the projected frame
#[derive(Debug, Clone, PartialEq)]
pub struct PostcodePoint {
    pub postcode: String,
    pub easting: f64,
    pub northing: f64,
    pub geometry: Point<f64>,
}

impl PostcodePoint {
    /// Create a point, refusing non-finite coordinates
    pub fn new(postcode: impl Into<String>, easting: f64, northing: f64) -> Option<Self> {
        if !easting.is_finite() || !northing.is_finite() {
            return None;
        }
        Some(Self {
            postcode: postcode.into(),
            easting,
            northing,
            geometry: Point::new(easting, northing),
        })
    }
}
