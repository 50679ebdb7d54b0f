//! Postcode to grid-cell matcher.
//!
//! Reads a NOx grid CSV and an ONSPD postcode CSV, matches every postcode to
//! the grid cell containing it, and writes the match table as CSV.

mod input;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use airlock::config::CleaningOptions;
use airlock::crs::CrsContext;
use airlock::export::{prepare_export_table, with_geographic};
use airlock::pipeline::{run_with_progress, PipelineReport};
use airlock::validation::CoordinateQualityReport;
use airlock::AirlockConfig;

use crate::input::load_csv_table;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "airlock")]
#[command(about = "Match UK postcodes to the 1 km grid cells containing them")]
struct Args {
    /// NOx grid dataset (CSV with X/Y cell centers)
    #[arg(long)]
    grid: PathBuf,

    /// ONSPD postcode dataset (CSV, optionally .gz)
    #[arg(long)]
    postcodes: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the match table
    #[arg(short, long, default_value = "airlock_output.csv")]
    output: PathBuf,

    /// Points per matching batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Grid cell size in metres
    #[arg(long)]
    cell_size: Option<f64>,

    /// Match batches in parallel
    #[arg(long)]
    parallel: bool,

    /// Skip postcode cleaning (missing coords, terminated, duplicates)
    #[arg(long)]
    no_clean: bool,

    /// Add WGS84 lon/lat columns to the output
    #[arg(long)]
    with_lonlat: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("AirLock postcode to grid matcher");

    let config = build_config(&args)?;

    let grid = load_csv_table(&args.grid).context("Failed to load grid dataset")?;
    let postcodes = load_csv_table(&args.postcodes).context("Failed to load postcode dataset")?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let report = run_with_progress(&grid, &postcodes, &config, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })
    .context("Matching failed")?;
    pb.finish_with_message("Matching complete");

    log_quality("Grid", &report.grid_quality);
    log_quality("Postcode", &report.postcode_quality);

    write_output(&args, &config, &report)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    } else {
        println!("Grid cells loaded:   {}", report.cells.len());
        println!("Postcodes loaded:    {}", report.points_loaded);
        println!("Matched:             {}", report.summary.matched);
        println!("Unmatched:           {}", report.summary.unmatched);
        println!(
            "Match rate:          {:.2}%",
            report.summary.match_rate * 100.0
        );
    }

    Ok(())
}

/// Config file (or defaults) with command-line overrides applied
fn build_config(args: &Args) -> Result<AirlockConfig> {
    let mut config = match &args.config {
        Some(path) => AirlockConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AirlockConfig::default(),
    };

    if let Some(batch_size) = args.batch_size {
        config.matching.batch_size = batch_size;
    }
    if let Some(cell_size) = args.cell_size {
        config.grid.cell_size = cell_size;
    }
    if args.parallel {
        config.matching.parallel = true;
    }
    if args.no_clean {
        config.cleaning = CleaningOptions {
            drop_missing_coordinates: false,
            drop_duplicate_identifiers: false,
            active_only: false,
            termination_column: None,
        };
    }

    if let Err(e) = config.validate() {
        anyhow::bail!("Unusable configuration: {}", e);
    }
    Ok(config)
}

fn log_quality(dataset: &str, report: &CoordinateQualityReport) {
    info!(
        "{} coordinates: {} rows, {} valid, {} invalid",
        dataset, report.total_rows, report.valid_coords, report.invalid_coords
    );
    if report.invalid_coords > 0 {
        warn!(
            "{} rows with invalid coordinates, e.g. rows {:?}",
            dataset, report.invalid_examples
        );
    }
}

fn write_output(args: &Args, config: &AirlockConfig, report: &PipelineReport) -> Result<()> {
    let mut rows = prepare_export_table(&report.matches);

    if args.with_lonlat {
        let crs = CrsContext::new(&config.crs.geographic, &config.crs.projected)?;
        with_geographic(&mut rows, &crs).context("Failed to compute lon/lat")?;
    }

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    if rows.is_empty() {
        // serialize() only writes headers alongside the first row
        writer.write_record(["postcode", "easting", "northing", "matched_grid_id", "lon", "lat"])?;
    }
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), args.output.display());
    Ok(())
}
