//! Pipeline configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::crs::{CRS_OSGB36, CRS_WGS84};
use crate::error::{AirlockError, Result};

/// 1 km x 1 km grid cells
pub const GRID_CELL_SIZE_M: f64 = 1000.0;
pub const DEFAULT_BATCH_SIZE: usize = 100_000;
pub const DEFAULT_GRID_ID_COLUMN: &str = "GridCode";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AirlockConfig {
    pub grid: GridOptions,
    pub crs: CrsConfig,
    pub matching: MatchOptions,
    pub cleaning: CleaningOptions,
    pub bounds: CoordinateBounds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Cell side length in metres
    pub cell_size: f64,
    /// Column holding the cell identifier; `None` always synthesizes "<X>_<Y>"
    pub id_column: Option<String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            cell_size: GRID_CELL_SIZE_M,
            id_column: Some(DEFAULT_GRID_ID_COLUMN.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrsConfig {
    pub projected: String,
    pub geographic: String,
}

impl Default for CrsConfig {
    fn default() -> Self {
        Self {
            projected: CRS_OSGB36.to_string(),
            geographic: CRS_WGS84.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Points per containment batch
    pub batch_size: usize,
    /// Run batches on the rayon pool
    pub parallel: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningOptions {
    pub drop_missing_coordinates: bool,
    pub drop_duplicate_identifiers: bool,
    pub active_only: bool,
    pub termination_column: Option<String>,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            drop_missing_coordinates: true,
            drop_duplicate_identifiers: true,
            active_only: true,
            termination_column: Some("doterm".to_string()),
        }
    }
}

/// Inclusive plausible range for each projected axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateBounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Default for CoordinateBounds {
    fn default() -> Self {
        // British National Grid extent
        Self {
            x: (0.0, 700_000.0),
            y: (0.0, 1_300_000.0),
        }
    }
}

impl CoordinateBounds {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x.0 && x <= self.x.1 && y >= self.y.0 && y <= self.y.1
    }
}

impl AirlockConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AirlockError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: AirlockConfig = toml::from_str(&content).map_err(|e| {
            AirlockError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no pipeline run can work with
    pub fn validate(&self) -> Result<()> {
        if !(self.grid.cell_size.is_finite() && self.grid.cell_size > 0.0) {
            return Err(AirlockError::InvalidInput(format!(
                "grid cell size must be positive, got {}",
                self.grid.cell_size
            )));
        }
        if self.matching.batch_size == 0 {
            return Err(AirlockError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }
        for (axis, (lo, hi)) in [("x", self.bounds.x), ("y", self.bounds.y)] {
            // NaN bounds have no ordering and are rejected too
            if !matches!(lo.partial_cmp(&hi), Some(Ordering::Less | Ordering::Equal)) {
                return Err(AirlockError::InvalidInput(format!(
                    "{} bounds are inverted: [{}, {}]",
                    axis, lo, hi
                )));
            }
        }
        Ok(())
    }
}
