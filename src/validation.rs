//! Schema and coordinate range checks for the input tables.
//!
//! Nothing here aborts on bad rows: missing columns are reported as a list
//! and out-of-range coordinates as counts plus a few example rows.

use serde::Serialize;

use crate::config::CoordinateBounds;
use crate::error::{AirlockError, Result};
use crate::models::Table;

/// Grid center easting/northing
pub const GRID_X: &str = "X";
pub const GRID_Y: &str = "Y";

/// ONSPD postcode, easting and northing
pub const POSTCODE_ID: &str = "pcd";
pub const POSTCODE_X: &str = "oseast1m";
pub const POSTCODE_Y: &str = "osnrth1m";

const MAX_INVALID_EXAMPLES: usize = 5;

/// Ordered description of the columns a dataset is expected to carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub required: Vec<&'static str>,
    pub optional: Vec<&'static str>,
}

impl TableSchema {
    /// DEFRA NOx background grid
    pub fn nox_grid() -> Self {
        Self {
            name: "NOx grid",
            required: vec![GRID_X, GRID_Y],
            optional: vec!["NOx", "nox_annual_mean", "nox"],
        }
    }

    /// ONS Postcode Directory extract
    pub fn onspd_postcodes() -> Self {
        Self {
            name: "Postcode",
            required: vec![POSTCODE_ID, POSTCODE_X, POSTCODE_Y],
            optional: vec!["pcd2", "pcd3", "lat", "long", "dointr", "doterm"],
        }
    }

    pub fn check(&self, table: &Table) -> SchemaCheck {
        check_required_columns(table.columns(), self.required.as_slice())
    }

    /// Optional columns the table carries, in descriptor order
    pub fn present_optional(&self, table: &Table) -> Vec<&'static str> {
        self.optional
            .iter()
            .copied()
            .filter(|col| table.has_column(col))
            .collect()
    }

    /// Like `check`, but a missing column becomes a `Schema` error
    pub fn require(&self, table: &Table) -> Result<()> {
        let check = self.check(table);
        if check.is_valid() {
            Ok(())
        } else {
            Err(AirlockError::schema(self.name, check.missing))
        }
    }
}

/// Outcome of a required-column check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaCheck {
    /// Missing names, in the order they were required
    pub missing: Vec<String>,
}

impl SchemaCheck {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Case-insensitive set difference `required - available`
pub fn check_required_columns<A, R>(available: &[A], required: &[R]) -> SchemaCheck
where
    A: AsRef<str>,
    R: AsRef<str>,
{
    let available: Vec<String> = available
        .iter()
        .map(|c| c.as_ref().to_lowercase())
        .collect();

    let missing = required
        .iter()
        .map(|c| c.as_ref())
        .filter(|col| !available.contains(&col.to_lowercase()))
        .map(str::to_string)
        .collect();

    SchemaCheck { missing }
}

/// Coordinate quality of one input table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoordinateQualityReport {
    pub total_rows: usize,
    pub valid_coords: usize,
    pub invalid_coords: usize,
    /// Row indices of the first few invalid rows
    pub invalid_examples: Vec<usize>,
}

/// Count rows whose coordinates are numeric and inside `bounds` (inclusive).
pub fn check_coordinate_ranges(
    table: &Table,
    x_column: &str,
    y_column: &str,
    bounds: &CoordinateBounds,
) -> Result<CoordinateQualityReport> {
    let missing: Vec<String> = [x_column, y_column]
        .into_iter()
        .filter(|c| !table.has_column(c))
        .map(str::to_string)
        .collect();
    let (Some(xi), Some(yi)) = (table.column_index(x_column), table.column_index(y_column))
    else {
        return Err(AirlockError::schema("Coordinate", missing));
    };

    let mut report = CoordinateQualityReport {
        total_rows: table.len(),
        ..Default::default()
    };

    for (idx, row) in table.rows().iter().enumerate() {
        let valid = match (row[xi].as_f64(), row[yi].as_f64()) {
            (Some(x), Some(y)) => bounds.contains(x, y),
            _ => false,
        };
        if valid {
            report.valid_coords += 1;
        } else {
            report.invalid_coords += 1;
            if report.invalid_examples.len() < MAX_INVALID_EXAMPLES {
                report.invalid_examples.push(idx);
            }
        }
    }

    Ok(report)
}

pub fn validate_nox_coordinates(
    table: &Table,
    bounds: &CoordinateBounds,
) -> Result<CoordinateQualityReport> {
    check_coordinate_ranges(table, GRID_X, GRID_Y, bounds)
}

pub fn validate_postcode_coordinates(
    table: &Table,
    bounds: &CoordinateBounds,
) -> Result<CoordinateQualityReport> {
    check_coordinate_ranges(table, POSTCODE_X, POSTCODE_Y, bounds)
}
