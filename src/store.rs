//! CSV and JSON persistence for scraped datasets

use crate::models::{
    Dataset, RawListing, DESCRIPTION_MISSING, IMAGE_MISSING, LOCATION_MISSING, PRICE_MISSING,
    UNKNOWN,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

pub const RAW_COLUMNS: [&str; 5] = ["categorie", "type", "prix", "adresse", "image_lien"];
pub const CLEANED_COLUMNS: [&str; 9] = [
    "categorie",
    "type",
    "prix",
    "adresse",
    "image_lien",
    "prix_brut",
    "prix_numerique",
    "a_prix",
    "a_image",
];

fn bool_cell(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Write the dataset as CSV: header row, then one line per listing.
/// Missing values are written as their placeholder text.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    match dataset {
        Dataset::Raw(rows) => {
            csv.write_record(RAW_COLUMNS)?;
            for row in rows {
                csv.write_record([
                    row.category.as_str(),
                    row.description_or_sentinel(),
                    row.price_or_sentinel(),
                    row.location_or_sentinel(),
                    row.image_or_sentinel(),
                ])?;
            }
        }
        Dataset::Cleaned(rows) => {
            csv.write_record(CLEANED_COLUMNS)?;
            for row in rows {
                let numeric = row.price_numeric.map(|p| p.to_string()).unwrap_or_default();
                csv.write_record([
                    row.category.as_str(),
                    row.description_or_sentinel(),
                    row.price_or_sentinel(),
                    row.location_or_sentinel(),
                    row.image_or_sentinel(),
                    row.price_raw_or_sentinel(),
                    numeric.as_str(),
                    bool_cell(row.has_price),
                    bool_cell(row.has_image),
                ])?;
            }
        }
    }

    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Encode the dataset as CSV bytes
pub fn to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(dataset, &mut buffer)?;
    Ok(buffer)
}

/// Save the dataset to `path`. Empty datasets are not written; returns
/// whether a file was produced.
pub async fn save_csv(dataset: &Dataset, path: &Path) -> Result<bool> {
    if dataset.is_empty() {
        warn!("No data to save to {}", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let bytes = to_csv_bytes(dataset)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("💾 Saved {} rows to {}", dataset.len(), path.display());
    Ok(true)
}

/// Save the dataset as pretty-printed JSON
pub async fn save_json(dataset: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(dataset)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("💾 Saved {} rows to {}", dataset.len(), path.display());
    Ok(())
}

/// `{slug}_{cleaned|raw}_{YYYYmmdd_HHMMSS}.csv`
pub fn default_file_name(slug: &str, cleaned: bool, at: DateTime<Utc>) -> String {
    let kind = if cleaned { "cleaned" } else { "raw" };
    format!("{}_{}_{}.csv", slug, kind, at.format("%Y%m%d_%H%M%S"))
}

/// Listings read back from a CSV file
#[derive(Debug, Default)]
pub struct CsvImport {
    pub listings: Vec<RawListing>,
    /// Expected columns the file did not have
    pub schema_gaps: Vec<String>,
}

fn cell(record: &csv::StringRecord, index: Option<usize>, sentinel: &str) -> Option<String> {
    match index {
        None => Some(UNKNOWN.to_string()),
        Some(i) => record
            .get(i)
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != sentinel)
            .map(str::to_string),
    }
}

/// Read listings from CSV written by [`write_csv`] or another tool.
///
/// Only the scraped columns are read; derived columns are recomputed by
/// normalizing. A missing text column is filled with `"unknown"` on every
/// row, a missing image column means no image.
pub fn read_csv<R: Read>(reader: R) -> Result<CsvImport> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers().context("Failed to read CSV header")?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let mut import = CsvImport::default();
    let indexes: Vec<Option<usize>> = RAW_COLUMNS.iter().map(|name| column(*name)).collect();
    for (name, index) in RAW_COLUMNS.iter().zip(&indexes) {
        if index.is_none() {
            warn!("Column '{}' missing from CSV, using defaults", name);
            import.schema_gaps.push(name.to_string());
        }
    }

    for (line, record) in csv.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", line + 1))?;
        let image_url = match indexes[4] {
            None => None,
            index => cell(&record, index, IMAGE_MISSING),
        };
        import.listings.push(RawListing {
            category: cell(&record, indexes[0], "").unwrap_or_else(|| UNKNOWN.to_string()),
            description: cell(&record, indexes[1], DESCRIPTION_MISSING),
            price_text: cell(&record, indexes[2], PRICE_MISSING),
            location_text: cell(&record, indexes[3], LOCATION_MISSING),
            image_url,
        });
    }

    Ok(import)
}

/// Read listings from a CSV file on disk
pub fn load_csv(path: &Path) -> Result<CsvImport> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("The file {} does not exist", path.display()))?;
    let import = read_csv(file)?;
    info!("Loaded {} rows from {}", import.listings.len(), path.display());
    Ok(import)
}
