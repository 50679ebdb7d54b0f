//! End-to-end runs through the public API.

use airlock::config::MatchOptions;
use airlock::crs::{CrsContext, CRS_OSGB36, CRS_WGS84};
use airlock::export::prepare_export_table;
use airlock::grid::{build_grid, cells_to_geometry_set};
use airlock::pip::{match_postcodes_to_grid, summarize_matches};
use airlock::pipeline::run;
use airlock::postcodes::load_postcodes;
use airlock::{AirlockConfig, AirlockError, CellValue, Table};

fn postcode_table(rows: Vec<(&str, Option<f64>, Option<f64>)>) -> Table {
    let mut table = Table::new(["pcd", "oseast1m", "osnrth1m", "doterm"]);
    for (pcd, e, n) in rows {
        table.push_row(vec![pcd.into(), e.into(), n.into(), CellValue::Missing]);
    }
    table
}

#[test]
fn single_cell_single_postcode() {
    let grid = Table::new(["X", "Y"]).with_row([500000.0, 200000.0]);
    let postcodes = postcode_table(vec![("AB1 0AA", Some(500000.0), Some(200000.0))]);

    let report = run(&grid, &postcodes, &AirlockConfig::default()).unwrap();

    assert_eq!(report.matches.len(), 1);
    assert_eq!(
        report.matches.rows[0].matched_grid_id.as_deref(),
        Some("500000_200000")
    );
    assert_eq!(report.summary.matched, 1);
    assert_eq!(report.summary.unmatched, 0);
    assert_eq!(report.summary.match_rate, 1.0);
}

#[test]
fn configured_grid_id_is_used() {
    let mut grid = Table::new(["GridCode", "X", "Y", "NOx"]);
    grid.push_row(vec![
        "NX-1".into(),
        500000.0.into(),
        200000.0.into(),
        18.4.into(),
    ]);
    let postcodes = postcode_table(vec![("AB1 0AA", Some(500100.0), Some(199900.0))]);

    let report = run(&grid, &postcodes, &AirlockConfig::default()).unwrap();
    assert_eq!(
        report.matches.rows[0].matched_grid_id.as_deref(),
        Some("NX-1")
    );
}

#[test]
fn csv_identifiers_survive_the_run() {
    let mut grid = Table::new(["GridCode", "X", "Y"]);
    grid.push_row(["007", "500", "500"].into_iter().map(CellValue::parse).collect());
    let mut postcodes = Table::new(["pcd", "oseast1m", "osnrth1m", "doterm"]);
    for fields in [["01234", "100", "100", ""], ["1234", "200", "200", ""]] {
        postcodes.push_row(fields.into_iter().map(CellValue::parse).collect());
    }

    let report = run(&grid, &postcodes, &AirlockConfig::default()).unwrap();

    let ids: Vec<_> = report
        .matches
        .rows
        .iter()
        .map(|r| (r.postcode.as_str(), r.matched_grid_id.as_deref()))
        .collect();
    assert_eq!(ids, vec![("01234", Some("007")), ("1234", Some("007"))]);
}

#[test]
fn row_level_problems_do_not_abort() {
    let grid = Table::new(["x", "y"])
        .with_row([500.0, 500.0])
        .with_row([1500.0, 500.0])
        .with_row([-5000.0, 500.0]);
    let postcodes = postcode_table(vec![
        ("P1", Some(100.0), Some(100.0)),
        ("P2", None, Some(100.0)),
        ("P3", Some(1200.0), Some(900.0)),
        ("P1", Some(1200.0), Some(900.0)),
        ("P4", Some(50_000.0), Some(50_000.0)),
    ]);

    let report = run(&grid, &postcodes, &AirlockConfig::default()).unwrap();

    assert_eq!(report.grid_quality.invalid_coords, 1);
    assert_eq!(report.grid_quality.invalid_examples, vec![2]);
    assert_eq!(report.postcode_quality.invalid_coords, 1);
    assert_eq!(report.points_loaded, 3);

    let ids: Vec<_> = report
        .matches
        .rows
        .iter()
        .map(|r| (r.postcode.as_str(), r.matched_grid_id.as_deref()))
        .collect();
    assert_eq!(
        ids,
        vec![("P1", Some("500_500")), ("P3", Some("1500_500")), ("P4", None)]
    );
    assert_eq!(report.summary.matched + report.summary.unmatched, 3);
}

#[test]
fn schema_error_stops_the_run() {
    let grid = Table::new(["X", "NOx"]);
    let postcodes = postcode_table(vec![]);

    match run(&grid, &postcodes, &AirlockConfig::default()) {
        Err(AirlockError::Schema { missing, .. }) => assert_eq!(missing, vec!["Y"]),
        other => panic!("unexpected {:?}", other.map(|r| r.summary)),
    }
}

#[test]
fn empty_postcodes_give_empty_table() {
    let grid = Table::new(["X", "Y"]).with_row([500.0, 500.0]);
    let postcodes = postcode_table(vec![]);

    let report = run(&grid, &postcodes, &AirlockConfig::default()).unwrap();
    assert!(report.matches.is_empty());
    assert_eq!(report.matches.crs, CRS_OSGB36);
    assert_eq!(report.summary.total_postcodes, 0);
    assert_eq!(report.summary.match_rate, 0.0);
}

#[test]
fn batched_and_unbatched_runs_agree() {
    let mut grid = Table::new(["X", "Y"]);
    for gx in 0..10 {
        for gy in 0..10 {
            grid.push_row(vec![
                (500.0 + 1000.0 * gx as f64).into(),
                (500.0 + 1000.0 * gy as f64).into(),
            ]);
        }
    }
    let cells = build_grid(&grid, &Default::default()).unwrap();

    let rows = (0..2_500)
        .map(|i| {
            let x = (i * 37 % 11_000) as f64;
            let y = (i * 53 % 11_000) as f64;
            (format!("PC{}", i), Some(x), Some(y))
        })
        .collect::<Vec<_>>();
    let mut table = Table::new(["pcd", "oseast1m", "osnrth1m"]);
    for (pcd, e, n) in rows {
        table.push_row(vec![pcd.into(), e.into(), n.into()]);
    }
    let points = load_postcodes(&table, None).unwrap();

    let whole = match_postcodes_to_grid(
        &points,
        &cells,
        &MatchOptions {
            batch_size: points.len(),
            parallel: false,
        },
    );
    let batched = match_postcodes_to_grid(
        &points,
        &cells,
        &MatchOptions {
            batch_size: 128,
            parallel: true,
        },
    );
    assert_eq!(whole, batched);

    let summary = summarize_matches(&whole);
    assert!(summary.unmatched > 0);
    assert!(summary.matched > 0);

    let export = prepare_export_table(&whole);
    assert_eq!(export.len(), whole.len());
    assert!(export.last().unwrap().matched_grid_id.is_none());
}

#[test]
fn grid_reprojects_to_wgs84() {
    let grid = Table::new(["X", "Y"]).with_row([530500.0, 180500.0]);
    let cells = build_grid(&grid, &Default::default()).unwrap();
    let ctx = CrsContext::british_national_grid().unwrap();

    let set = ctx
        .reproject(cells_to_geometry_set(&cells, CRS_OSGB36), CRS_WGS84)
        .unwrap();
    assert_eq!(set.crs.as_deref(), Some(CRS_WGS84));
    assert_eq!(set.len(), 1);
}
