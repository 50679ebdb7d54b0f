//! Basic cleaning of ONSPD-style postcode tables.

use hashbrown::HashSet;
use tracing::debug;

use crate::config::CleaningOptions;
use crate::models::{CellValue, Table};
use crate::validation::{POSTCODE_ID, POSTCODE_X, POSTCODE_Y};

/// Apply the cleaning steps in a fixed order:
///
/// 1. drop rows with missing easting/northing
/// 2. keep only active (non-terminated) postcodes
/// 3. drop duplicate postcodes, keeping the first occurrence
///
/// A step whose column is absent is skipped.
pub fn filter_postcodes(table: &Table, options: &CleaningOptions) -> Table {
    let mut cleaned = table.clone();

    // 1) Drop missing coordinates
    if options.drop_missing_coordinates {
        if let (Some(xi), Some(yi)) = (
            cleaned.column_index(POSTCODE_X),
            cleaned.column_index(POSTCODE_Y),
        ) {
            let before = cleaned.len();
            cleaned.retain_rows(|row| row[xi].as_f64().is_some() && row[yi].as_f64().is_some());
            debug!("Dropped {} rows with missing coordinates", before - cleaned.len());
        }
    }

    // 2) Keep only active postcodes
    if options.active_only {
        if let Some(ti) = options
            .termination_column
            .as_deref()
            .and_then(|col| cleaned.column_index(col))
        {
            let before = cleaned.len();
            cleaned.retain_rows(|row| is_active(&row[ti]));
            debug!("Dropped {} terminated postcodes", before - cleaned.len());
        }
    }

    // 3) Drop duplicate postcodes
    if options.drop_duplicate_identifiers {
        if let Some(pi) = cleaned.column_index(POSTCODE_ID) {
            let before = cleaned.len();
            let mut seen: HashSet<Option<String>> = HashSet::new();
            cleaned.retain_rows(|row| seen.insert(row[pi].to_key()));
            debug!("Dropped {} duplicate postcodes", before - cleaned.len());
        }
    }

    cleaned
}

/// No termination date: missing, "" or " "
fn is_active(value: &CellValue) -> bool {
    match value {
        CellValue::Text(s) => s.is_empty() || s == " ",
        other => other.is_missing(),
    }
}
