//! Coordinate reference system handling.
//!
//! Converts between the geographic frame (WGS84 lon/lat) and the projected
//! frame (British National Grid easting/northing) and reprojects framed
//! geometry collections. Transforms are pure Rust via proj4rs and are built
//! once per `CrsContext`.

use geo::{Coord, Geometry, MapCoords};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use tracing::debug;

use crate::error::{AirlockError, Result};

/// British National Grid
pub const CRS_OSGB36: &str = "EPSG:27700";
/// Latitude/Longitude
pub const CRS_WGS84: &str = "EPSG:4326";

const OSGB36_TOWGS84: &str = "+towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489";

/// Normalize a frame identifier for comparison ("epsg:27700 " -> "EPSG:27700")
pub fn normalize_crs(id: &str) -> String {
    let trimmed = id.trim();
    if trimmed.starts_with('+') {
        trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        trimmed.to_uppercase()
    }
}

/// Proj string and geographic flag for a supported frame identifier
fn proj_definition(id: &str) -> Option<(String, bool)> {
    let id = normalize_crs(id);
    if id.starts_with("+proj=") {
        let geographic = id.contains("+proj=longlat") || id.contains("+proj=latlong");
        return Some((id, geographic));
    }

    let code: u32 = id.strip_prefix("EPSG:")?.parse().ok()?;
    let def = match code {
        4326 => ("+proj=longlat +datum=WGS84 +no_defs".to_string(), true),
        4258 => (
            "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs".to_string(),
            true,
        ),
        4277 => (
            format!("+proj=longlat +ellps=airy {} +no_defs", OSGB36_TOWGS84),
            true,
        ),
        27700 => (
            format!(
                "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 \
                 +ellps=airy {} +units=m +no_defs",
                OSGB36_TOWGS84
            ),
            false,
        ),
        3857 => (
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"
                .to_string(),
            false,
        ),
        _ => return None,
    };
    Some(def)
}

struct Frame {
    id: String,
    proj: Proj,
    geographic: bool,
}

impl Frame {
    fn new(id: &str) -> Result<Self> {
        let (definition, geographic) =
            proj_definition(id).ok_or_else(|| AirlockError::UnsupportedCrs(id.to_string()))?;
        let proj = Proj::from_proj_string(&definition)
            .map_err(|e| AirlockError::UnsupportedCrs(format!("{}: {:?}", id, e)))?;
        Ok(Self {
            id: normalize_crs(id),
            proj,
            geographic,
        })
    }
}

/// One-directional transform between two frames
pub struct Transformer {
    source: Frame,
    target: Frame,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("source", &self.source.id)
            .field("target", &self.target.id)
            .finish_non_exhaustive()
    }
}

impl Transformer {
    pub fn new(source: &str, target: &str) -> Result<Self> {
        Ok(Self {
            source: Frame::new(source)?,
            target: Frame::new(target)?,
        })
    }

    pub fn source_crs(&self) -> &str {
        &self.source.id
    }

    pub fn target_crs(&self) -> &str {
        &self.target.id
    }

    /// Transform one coordinate pair, degrees in and out for geographic frames
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let (in_x, in_y) = if self.source.geographic {
            (x.to_radians(), y.to_radians())
        } else {
            (x, y)
        };

        let mut point = (in_x, in_y, 0.0);
        transform(&self.source.proj, &self.target.proj, &mut point)
            .map_err(|e| AirlockError::Transform(format!("({}, {}): {:?}", x, y, e)))?;

        let (out_x, out_y) = if self.target.geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(AirlockError::Transform(format!(
                "({}, {}) has no finite image in {}",
                x, y, self.target.id
            )));
        }
        Ok((out_x, out_y))
    }
}

/// A geometry collection with its declared reference frame
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySet {
    pub crs: Option<String>,
    pub geometries: Vec<Geometry<f64>>,
}

impl GeometrySet {
    pub fn new(crs: Option<&str>, geometries: Vec<Geometry<f64>>) -> Self {
        Self {
            crs: crs.map(str::to_string),
            geometries,
        }
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

/// Pre-built transforms between the pipeline's geographic and projected frames
pub struct CrsContext {
    to_projected: Transformer,
    to_geographic: Transformer,
}

impl std::fmt::Debug for CrsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsContext")
            .field("geographic", &self.geographic_crs())
            .field("projected", &self.projected_crs())
            .finish()
    }
}

impl CrsContext {
    pub fn new(geographic: &str, projected: &str) -> Result<Self> {
        debug!("Building transforms {} <-> {}", geographic, projected);
        Ok(Self {
            to_projected: Transformer::new(geographic, projected)?,
            to_geographic: Transformer::new(projected, geographic)?,
        })
    }

    /// WGS84 <-> British National Grid
    pub fn british_national_grid() -> Result<Self> {
        Self::new(CRS_WGS84, CRS_OSGB36)
    }

    pub fn geographic_crs(&self) -> &str {
        self.to_projected.source_crs()
    }

    pub fn projected_crs(&self) -> &str {
        self.to_projected.target_crs()
    }

    /// (lon, lat) -> (easting, northing)
    pub fn to_projected(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        self.to_projected.transform(lon, lat)
    }

    /// (easting, northing) -> (lon, lat)
    pub fn to_geographic(&self, easting: f64, northing: f64) -> Result<(f64, f64)> {
        self.to_geographic.transform(easting, northing)
    }

    /// Reproject a collection to `target`.
    ///
    /// A collection already in the target frame is returned as is. Frame pairs
    /// other than the context's own get a transform built for this call.
    pub fn reproject(&self, set: GeometrySet, target: &str) -> Result<GeometrySet> {
        let source = set.crs.as_deref().map(normalize_crs).ok_or_else(|| {
            AirlockError::InvalidInput("Input geometry collection has no CRS set.".to_string())
        })?;
        let target = normalize_crs(target);

        if source == target {
            return Ok(set);
        }

        let adhoc;
        let transformer = if source == self.to_projected.source_crs()
            && target == self.to_projected.target_crs()
        {
            &self.to_projected
        } else if source == self.to_geographic.source_crs()
            && target == self.to_geographic.target_crs()
        {
            &self.to_geographic
        } else {
            adhoc = Transformer::new(&source, &target)?;
            &adhoc
        };

        debug!(
            "Reprojecting {} geometries from {} to {}",
            set.len(),
            source,
            target
        );

        let geometries = set
            .geometries
            .iter()
            .map(|geometry| {
                geometry.try_map_coords(|c: Coord<f64>| {
                    transformer
                        .transform(c.x, c.y)
                        .map(|(x, y)| Coord { x, y })
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GeometrySet {
            crs: Some(target),
            geometries,
        })
    }
}
