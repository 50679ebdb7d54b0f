//! Postcode point loading.

use geo::Geometry;
use tracing::{debug, info};

use crate::config::CleaningOptions;
use crate::crs::GeometrySet;
use crate::error::{AirlockError, Result};
use crate::filters::filter_postcodes;
use crate::models::{PostcodePoint, Table};
use crate::validation::{TableSchema, POSTCODE_ID, POSTCODE_X, POSTCODE_Y};

/// Convert an ONSPD-style table into postcode points.
///
/// Required columns are `pcd`, `oseast1m` and `osnrth1m`. With `cleaning`
/// set, the table goes through `filter_postcodes` first. Rows whose
/// coordinates are still missing are skipped either way.
pub fn load_postcodes(
    table: &Table,
    cleaning: Option<&CleaningOptions>,
) -> Result<Vec<PostcodePoint>> {
    TableSchema::onspd_postcodes().require(table)?;

    let cleaned;
    let table = match cleaning {
        Some(options) => {
            cleaned = filter_postcodes(table, options);
            info!(
                "Cleaning kept {} of {} postcode rows",
                cleaned.len(),
                table.len()
            );
            &cleaned
        }
        None => table,
    };

    let column = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| AirlockError::schema("Postcode", vec![name.to_string()]))
    };
    let (pi, xi, yi) = (
        column(POSTCODE_ID)?,
        column(POSTCODE_X)?,
        column(POSTCODE_Y)?,
    );

    let points: Vec<PostcodePoint> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let easting = row[xi].as_f64()?;
            let northing = row[yi].as_f64()?;
            let postcode = row[pi].to_key().unwrap_or_default();
            PostcodePoint::new(postcode, easting, northing)
        })
        .collect();

    debug!(
        "Skipped {} postcode rows without coordinates",
        table.len() - points.len()
    );
    info!("Loaded {} postcode points", points.len());

    Ok(points)
}

/// Point geometries as a framed collection, in point order
pub fn points_to_geometry_set(points: &[PostcodePoint], crs: &str) -> GeometrySet {
    GeometrySet::new(
        Some(crs),
        points.iter().map(|p| Geometry::Point(p.geometry)).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::{CrsContext, CRS_OSGB36, CRS_WGS84};
    use crate::models::CellValue;

    #[test]
    fn test_load_postcodes_from_table() {
        let mut table = Table::new(["pcd", "oseast1m", "osnrth1m"]);
        table.push_row(vec!["AB1 0AA".into(), 395000.0.into(), 800000.0.into()]);

        let points = load_postcodes(&table, None).unwrap();

        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_eq!(p.postcode, "AB1 0AA");
        assert_eq!(p.easting, 395000.0);
        assert_eq!(p.northing, 800000.0);
        assert_eq!(p.geometry.x(), 395000.0);
        assert_eq!(p.geometry.y(), 800000.0);
    }

    #[test]
    fn test_missing_coordinate_row_is_skipped() {
        let mut table = Table::new(["pcd", "oseast1m", "osnrth1m"]);
        table.push_row(vec!["A".into(), 1.0.into(), 1.0.into()]);
        table.push_row(vec!["B".into(), CellValue::Missing, 2.0.into()]);
        table.push_row(vec!["C".into(), 3.0.into(), 3.0.into()]);

        let points = load_postcodes(&table, None).unwrap();
        assert_eq!(points.len(), table.len() - 1);
        let ids: Vec<_> = points.iter().map(|p| p.postcode.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_cleaning_applied_when_requested() {
        let mut table = Table::new(["pcd", "oseast1m", "osnrth1m", "doterm"]);
        table.push_row(vec!["A".into(), 1.0.into(), 1.0.into(), CellValue::Missing]);
        table.push_row(vec!["A".into(), 2.0.into(), 2.0.into(), CellValue::Missing]);
        table.push_row(vec!["B".into(), 3.0.into(), 3.0.into(), "200101".into()]);

        let raw = load_postcodes(&table, None).unwrap();
        assert_eq!(raw.len(), 3);

        let cleaned = load_postcodes(&table, Some(&CleaningOptions::default())).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].easting, 1.0);
    }

    #[test]
    fn test_csv_postcode_text_is_kept_verbatim() {
        let mut table = Table::new(["pcd", "oseast1m", "osnrth1m"]);
        table.push_row(vec![
            CellValue::parse("01234"),
            CellValue::parse("395000"),
            CellValue::parse("800000"),
        ]);

        let points = load_postcodes(&table, Some(&CleaningOptions::default())).unwrap();
        assert_eq!(points[0].postcode, "01234");
        assert_eq!(points[0].easting, 395000.0);
    }

    #[test]
    fn test_points_to_geometry_set_reprojects() {
        let points = vec![
            PostcodePoint::new("SW1A 2DX", 530034.0, 180381.0).unwrap(),
            PostcodePoint::new("AB1 0AA", 395000.0, 800000.0).unwrap(),
        ];
        let set = points_to_geometry_set(&points, CRS_OSGB36);
        assert_eq!(set.len(), 2);
        assert_eq!(set.geometries[0], Geometry::Point(points[0].geometry));

        let ctx = CrsContext::british_national_grid().unwrap();
        let wgs84 = ctx.reproject(set, CRS_WGS84).unwrap();
        let Geometry::Point(london) = &wgs84.geometries[0] else {
            panic!("expected point");
        };
        assert!((london.x() - -0.1276).abs() < 0.01, "lon {}", london.x());
        assert!((london.y() - 51.5074).abs() < 0.01, "lat {}", london.y());
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let table = Table::new(["PCD", "lat", "long"]);
        match load_postcodes(&table, None) {
            Err(AirlockError::Schema { missing, .. }) => {
                assert_eq!(missing, vec!["oseast1m", "osnrth1m"])
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
