//! Batched point-in-cell matching.

use geo::Point;
use rayon::prelude::*;
use tracing::{debug, info};

use super::GridSpatialIndex;
use crate::config::MatchOptions;
use crate::crs::CRS_OSGB36;
use crate::models::{GridCell, PostcodePoint};

/// One postcode and the grid cell it falls in, if any
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRow {
    pub postcode: String,
    pub easting: f64,
    pub northing: f64,
    pub matched_grid_id: Option<String>,
    pub geometry: Point<f64>,
}

/// Result of a matching pass, one row per input point in input order
#[derive(Debug, Clone, PartialEq)]
pub struct MatchTable {
    pub crs: String,
    pub rows: Vec<MatchRow>,
}

impl MatchTable {
    /// Column set and order of every match table
    pub const COLUMNS: [&'static str; 5] = [
        "postcode",
        "easting",
        "northing",
        "matched_grid_id",
        "geometry",
    ];

    pub fn empty(crs: &str) -> Self {
        Self {
            crs: crs.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Matches postcode points against one fixed grid.
///
/// The spatial index is built once in `new` and only read afterwards, so
/// batches can share it across rayon workers.
pub struct GridMatcher<'a> {
    cells: &'a [GridCell],
    index: GridSpatialIndex,
    options: MatchOptions,
    crs: String,
}

impl<'a> GridMatcher<'a> {
    pub fn new(cells: &'a [GridCell], options: MatchOptions) -> Self {
        Self {
            cells,
            index: GridSpatialIndex::build(cells),
            options,
            crs: CRS_OSGB36.to_string(),
        }
    }

    /// Declared frame of the produced match tables
    pub fn with_crs(mut self, crs: &str) -> Self {
        self.crs = crs.to_string();
        self
    }

    fn batch_size(&self) -> usize {
        self.options.batch_size.max(1)
    }

    pub fn match_points(&self, points: &[PostcodePoint]) -> MatchTable {
        self.match_points_with_progress(points, |_, _| {})
    }

    /// Match all points, calling `progress(done, total)` after every batch.
    ///
    /// Batches are contiguous and concatenated in order, so the batch size
    /// never changes the result.
    pub fn match_points_with_progress<F>(
        &self,
        points: &[PostcodePoint],
        mut progress: F,
    ) -> MatchTable
    where
        F: FnMut(usize, usize),
    {
        if points.is_empty() {
            return MatchTable::empty(&self.crs);
        }

        let total = points.len();
        let batch_size = self.batch_size();
        info!(
            "Matching {} postcodes against {} grid cells (batch size {}{})",
            total,
            self.index.len(),
            batch_size,
            if self.options.parallel { ", parallel" } else { "" }
        );

        let mut rows = Vec::with_capacity(total);

        if self.options.parallel {
            // Indexed collect keeps batch order
            let batches: Vec<Vec<MatchRow>> = points
                .par_chunks(batch_size)
                .map(|batch| self.match_batch(batch))
                .collect();
            for batch in batches {
                rows.extend(batch);
                progress(rows.len(), total);
            }
        } else {
            for (batch_no, batch) in points.chunks(batch_size).enumerate() {
                rows.extend(self.match_batch(batch));
                debug!("Batch {} done ({}/{})", batch_no + 1, rows.len(), total);
                progress(rows.len(), total);
            }
        }

        MatchTable {
            crs: self.crs.clone(),
            rows,
        }
    }

    fn match_batch(&self, batch: &[PostcodePoint]) -> Vec<MatchRow> {
        batch
            .iter()
            .map(|p| MatchRow {
                postcode: p.postcode.clone(),
                easting: p.easting,
                northing: p.northing,
                matched_grid_id: self
                    .index
                    .lookup(p.geometry.x(), p.geometry.y())
                    .map(|pos| self.cells[pos].id.clone()),
                geometry: p.geometry,
            })
            .collect()
    }
}

/// Match each postcode to the grid cell that contains it
pub fn match_postcodes_to_grid(
    points: &[PostcodePoint],
    cells: &[GridCell],
    options: &MatchOptions,
) -> MatchTable {
    GridMatcher::new(cells, *options).match_points(points)
}
