use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::error::AnalysisError;
use crate::models::RawReview;

const TEXT_COLUMNS: [&str; 2] = ["Cleaned_Review", "cleaned_text"];

/// Cleaned review texts in file order, loaded fresh by each stage.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub column: String,
    pub documents: Vec<String>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Read a processed dataset, pick the effective text column, drop blank rows.
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let file = File::open(path).with_context(|| format!("Failed to open corpus {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader
        .headers()
        .with_context(|| format!("Reading headers of {}", path.display()))?
        .clone();

    let (col_idx, column) = TEXT_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == *name).map(|i| (i, name.to_string())))
        .ok_or_else(|| AnalysisError::MissingTextColumn(path.display().to_string()))?;

    let mut documents = Vec::new();
    let mut dropped = 0usize;
    for row in reader.records() {
        let row = row.with_context(|| format!("Parsing row of {}", path.display()))?;
        match row.get(col_idx).map(str::trim) {
            Some(text) if !text.is_empty() => documents.push(text.to_string()),
            _ => dropped += 1,
        }
    }

    debug!("Corpus column selected - column={}, dropped_empty={}", column, dropped);
    info!("Corpus loaded - path={}, documents={}", path.display(), documents.len());
    Ok(Corpus { column, documents })
}

pub fn read_raw_reviews(path: &Path) -> Result<Vec<RawReview>> {
    let file = File::open(path).with_context(|| format!("Failed to open raw reviews {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut out = Vec::new();
    for row in reader.deserialize() {
        let review: RawReview = row.with_context(|| format!("Parsing raw review in {}", path.display()))?;
        out.push(review);
    }
    Ok(out)
}

/// Write rows with a header line, creating parent directories as needed.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
