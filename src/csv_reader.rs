use anyhow::{Context, Result};
use std::io::{self, Read};
use std::path::Path;

use crate::data::Dataset;

/// Read a CSV document with a header row into a dataset.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", idx + 1))?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }

    Dataset::from_strings(headers, rows).context("CSV does not form a valid dataset")
}

pub fn read_csv_file(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    read_csv(file).with_context(|| format!("Failed to load {}", path.display()))
}

pub fn read_csv_from_stdin() -> Result<Dataset> {
    read_csv(io::stdin().lock())
}
