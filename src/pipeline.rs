//! End-to-end run: validate, clean, build, match, summarize.

use tracing::{debug, info};

use crate::config::AirlockConfig;
use crate::error::Result;
use crate::grid::build_grid;
use crate::models::{GridCell, Table};
use crate::pip::{summarize_matches, GridMatcher, MatchSummary, MatchTable};
use crate::postcodes::load_postcodes;
use crate::validation::{
    validate_nox_coordinates, validate_postcode_coordinates, CoordinateQualityReport,
    TableSchema,
};

/// Everything a run produces for the presentation layer
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub grid_quality: CoordinateQualityReport,
    pub postcode_quality: CoordinateQualityReport,
    pub cells: Vec<GridCell>,
    pub points_loaded: usize,
    pub matches: MatchTable,
    pub summary: MatchSummary,
}

pub fn run(grid: &Table, postcodes: &Table, config: &AirlockConfig) -> Result<PipelineReport> {
    run_with_progress(grid, postcodes, config, |_, _| {})
}

/// Same as `run`, reporting matcher progress after every batch
pub fn run_with_progress<F>(
    grid: &Table,
    postcodes: &Table,
    config: &AirlockConfig,
    progress: F,
) -> Result<PipelineReport>
where
    F: FnMut(usize, usize),
{
    config.validate()?;

    for (schema, table) in [
        (TableSchema::nox_grid(), grid),
        (TableSchema::onspd_postcodes(), postcodes),
    ] {
        schema.require(table)?;
        debug!(
            "{} dataset optional columns present: {:?}",
            schema.name,
            schema.present_optional(table)
        );
    }

    let grid_quality = validate_nox_coordinates(grid, &config.bounds)?;
    let postcode_quality = validate_postcode_coordinates(postcodes, &config.bounds)?;
    info!(
        "Coordinate quality: grid {}/{} valid, postcodes {}/{} valid",
        grid_quality.valid_coords,
        grid_quality.total_rows,
        postcode_quality.valid_coords,
        postcode_quality.total_rows
    );

    let points = load_postcodes(postcodes, Some(&config.cleaning))?;
    let cells = build_grid(grid, &config.grid)?;

    let matches = GridMatcher::new(&cells, config.matching)
        .with_crs(&config.crs.projected)
        .match_points_with_progress(&points, progress);
    let summary = summarize_matches(&matches);

    info!(
        "Matched {} of {} postcodes ({:.2}%)",
        summary.matched,
        summary.total_postcodes,
        summary.match_rate * 100.0
    );

    Ok(PipelineReport {
        grid_quality,
        postcode_quality,
        cells,
        points_loaded: points.len(),
        matches,
        summary,
    })
}
