use airlock::{CellValue, Table};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Load a CSV (optionally gzipped) into an in-memory table
pub fn load_csv_table(path: &Path) -> Result<Table> {
    info!("Loading table from {}", path.display());

    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let mut table = Table::new(headers.iter());

    for result in csv_reader.records() {
        let record = result.with_context(|| format!("Malformed row in {}", path.display()))?;
        table.push_row(record.iter().map(CellValue::parse).collect());
    }

    info!(
        "Loaded {} rows x {} columns",
        table.len(),
        table.columns().len()
    );
    Ok(table)
}
