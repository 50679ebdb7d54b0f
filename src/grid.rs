//! Grid cell construction from cell-center coordinates.

use geo::{Geometry, LineString, Polygon};
use tracing::{info, warn};

use crate::config::GridOptions;
use crate::crs::GeometrySet;
use crate::error::{AirlockError, Result};
use crate::models::{GridCell, Table};
use crate::validation::{GRID_X, GRID_Y};

/// Square polygon of side `cell_size` centered on (x, y).
///
/// The ring is closed: 4 corners plus the first corner repeated.
pub fn cell_polygon(x: f64, y: f64, cell_size: f64) -> Polygon<f64> {
    let half = cell_size / 2.0;

    Polygon::new(
        LineString::from(vec![
            (x - half, y - half),
            (x + half, y - half),
            (x + half, y + half),
            (x - half, y + half),
            (x - half, y - half),
        ]),
        vec![],
    )
}

/// Fallback id from the integer-truncated center, "<X>_<Y>"
pub fn synthesize_cell_id(x: f64, y: f64) -> String {
    format!("{}_{}", x.trunc() as i64, y.trunc() as i64)
}

/// Build one grid cell per row of a grid table with `X`/`Y` center columns.
///
/// Rows with a missing or non-numeric center are skipped and counted.
pub fn build_grid(table: &Table, options: &GridOptions) -> Result<Vec<GridCell>> {
    let (Some(xi), Some(yi)) = (table.column_index(GRID_X), table.column_index(GRID_Y)) else {
        let missing = [GRID_X, GRID_Y]
            .into_iter()
            .filter(|c| !table.has_column(c))
            .map(str::to_string)
            .collect();
        return Err(AirlockError::schema("NOx grid", missing));
    };

    let id_index = options
        .id_column
        .as_deref()
        .and_then(|col| table.column_index(col));

    info!(
        "Building {} m grid cells from {} rows (ids from {})",
        options.cell_size,
        table.len(),
        match (&options.id_column, id_index) {
            (Some(col), Some(_)) => col.as_str(),
            _ => "cell centers",
        }
    );

    let cells: Vec<GridCell> = table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(row_idx, row)| {
            let x = row[xi].as_f64()?;
            let y = row[yi].as_f64()?;
            let id = id_index
                .and_then(|i| row[i].to_key())
                .unwrap_or_else(|| synthesize_cell_id(x, y));

            Some(GridCell {
                id,
                center_x: x,
                center_y: y,
                geometry: cell_polygon(x, y, options.cell_size),
                row: row_idx,
            })
        })
        .collect();

    let skipped = table.len() - cells.len();
    if skipped > 0 {
        warn!("Skipped {} grid rows with missing cell centers", skipped);
    }
    info!("Built {} grid cells", cells.len());

    Ok(cells)
}

/// Cell polygons as a framed collection, in cell order
pub fn cells_to_geometry_set(cells: &[GridCell], crs: &str) -> GeometrySet {
    GeometrySet::new(
        Some(crs),
        cells
            .iter()
            .map(|c| Geometry::Polygon(c.geometry.clone()))
            .collect(),
    )
}
