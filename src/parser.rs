//! CSV parser for the vehicle maintenance dataset.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

use crate::dataset::Table;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decodes a dataset from raw bytes, transparently inflating gzip input.
///
/// # Errors
///
/// Returns an error if the bytes are not valid gzip (when flagged as such) or
/// not well-formed CSV.
pub fn parse_dataset(bytes: &[u8]) -> Result<Table> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut inflated = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut inflated)
            .context("failed to inflate gzip dataset")?;
        debug!(compressed = bytes.len(), inflated = inflated.len(), "Dataset inflated");
        return parse_csv(&inflated);
    }
    parse_csv(bytes)
}

fn parse_csv(bytes: &[u8]) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("malformed CSV record")?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(headers, rows))
}
