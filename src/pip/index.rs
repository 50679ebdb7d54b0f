//! Spatial index for fast grid cell lookups.

use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::GridCell;

/// Wrapper for R-tree indexing of grid cells
#[derive(Debug, Clone)]
struct IndexedCell {
    /// Position of the cell in the input collection
    position: usize,
    envelope: AABB<[f64; 2]>,
    bounds: (f64, f64, f64, f64),
}

impl RTreeObject for IndexedCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedCell {
    fn new(position: usize, cell: &GridCell) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = cell.bbox()?;
        Some(Self {
            position,
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
            bounds: (min_x, min_y, max_x, max_y),
        })
    }

    /// Half-open containment: min <= x < max and min <= y < max.
    ///
    /// Adjacent cells share edges, so a point on an edge belongs to the cell
    /// on its east/north side only.
    fn contains(&self, x: f64, y: f64) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds;
        x >= min_x && x < max_x && y >= min_y && y < max_y
    }
}

/// Read-only R-tree over grid cell envelopes.
///
/// Stores cell positions rather than cells, so lookups return an index into
/// the slice the index was built from.
pub struct GridSpatialIndex {
    tree: RTree<IndexedCell>,
}

impl GridSpatialIndex {
    /// Build spatial index from grid cells
    pub fn build(cells: &[GridCell]) -> Self {
        info!("Building spatial index for {} grid cells...", cells.len());

        let indexed: Vec<IndexedCell> = cells
            .iter()
            .enumerate()
            .filter_map(|(position, cell)| IndexedCell::new(position, cell))
            .collect();

        let tree = RTree::bulk_load(indexed);

        info!("Spatial index built with {} entries", tree.size());

        Self { tree }
    }

    /// Position of the cell containing (x, y).
    ///
    /// Candidates come from envelope intersection, then the half-open rule
    /// is applied. When several cells qualify (overlapping or duplicated
    /// cells) the earliest one in input order wins.
    pub fn lookup(&self, x: f64, y: f64) -> Option<usize> {
        let query_envelope = AABB::from_point([x, y]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ic| ic.contains(x, y))
            .map(|ic| ic.position)
            .min()
    }

    /// Get total number of indexed cells
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
