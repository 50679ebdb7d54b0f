//! Flat export rows for the match table.

use serde::Serialize;

use crate::crs::CrsContext;
use crate::error::Result;
use crate::pip::MatchTable;

/// Match row without geometry, ready for CSV/spreadsheet writers.
///
/// `lon`/`lat` stay empty unless filled by `with_geographic`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub postcode: String,
    pub easting: f64,
    pub northing: f64,
    pub matched_grid_id: Option<String>,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
}

/// Drop the geometry and sort by grid id (unmatched last), then postcode.
pub fn prepare_export_table(table: &MatchTable) -> Vec<ExportRow> {
    let mut rows: Vec<ExportRow> = table
        .rows
        .iter()
        .map(|r| ExportRow {
            postcode: r.postcode.clone(),
            easting: r.easting,
            northing: r.northing,
            matched_grid_id: r.matched_grid_id.clone(),
            lon: None,
            lat: None,
        })
        .collect();

    rows.sort_by(|a, b| {
        match (&a.matched_grid_id, &b.matched_grid_id) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.postcode.cmp(&b.postcode))
    });

    rows
}

/// Fill `lon`/`lat` from the projected coordinates
pub fn with_geographic(rows: &mut [ExportRow], crs: &CrsContext) -> Result<()> {
    for row in rows.iter_mut() {
        let (lon, lat) = crs.to_geographic(row.easting, row.northing)?;
        row.lon = Some(lon);
        row.lat = Some(lat);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pip::MatchRow;
    use geo::Point;

    fn row(postcode: &str, grid: Option<&str>, e: f64) -> MatchRow {
        MatchRow {
            postcode: postcode.to_string(),
            easting: e,
            northing: e * 10.0,
            matched_grid_id: grid.map(str::to_string),
            geometry: Point::new(e, e),
        }
    }

    #[test]
    fn test_prepare_export_table() {
        let table = MatchTable {
            crs: "EPSG:27700".to_string(),
            rows: vec![
                row("A", Some("G1"), 1.0),
                row("D", None, 4.0),
                row("C", Some("G2"), 3.0),
                row("B", Some("G1"), 2.0),
            ],
        };

        let out = prepare_export_table(&table);

        let grids: Vec<_> = out.iter().map(|r| r.matched_grid_id.as_deref()).collect();
        assert_eq!(grids, vec![Some("G1"), Some("G1"), Some("G2"), None]);
        let postcodes: Vec<_> = out.iter().map(|r| r.postcode.as_str()).collect();
        assert_eq!(postcodes, vec!["A", "B", "C", "D"]);
        assert!(out.iter().all(|r| r.lon.is_none()));
    }

    #[test]
    fn test_with_geographic() {
        let crs = CrsContext::british_national_grid().unwrap();
        let mut rows = vec![ExportRow {
            postcode: "SW1A 2DX".to_string(),
            easting: 530034.0,
            northing: 180381.0,
            matched_grid_id: None,
            lon: None,
            lat: None,
        }];
        with_geographic(&mut rows, &crs).unwrap();
        let (lon, lat) = (rows[0].lon.unwrap(), rows[0].lat.unwrap());
        assert!((lon - -0.1276).abs() < 0.01, "lon {}", lon);
        assert!((lat - 51.5074).abs() < 0.01, "lat {}", lat);
    }
}
