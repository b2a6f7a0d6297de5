use crate::item::Item;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format version written into every export.
pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("The collection is empty, there is nothing to export")]
    EmptyCollection,

    #[error("Failed to serialize library: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Self-contained snapshot of the collection. Importing it needs no
/// further catalog lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryExport {
    pub version: String,
    pub export_date: String,
    pub total_sets: usize,
    pub sets: Vec<Item>,
}

impl LibraryExport {
    pub fn new(items: &[Item], exported_at: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_sets: items.len(),
            sets: items.to_vec(),
        }
    }
}

/// Pretty-printed export document for `items`. All items are written.
pub fn export_library(items: &[Item], exported_at: DateTime<Utc>) -> Result<String, ExportError> {
    if items.is_empty() {
        return Err(ExportError::EmptyCollection);
    }
    Ok(serde_json::to_string_pretty(&LibraryExport::new(
        items,
        exported_at,
    ))?)
}

/// `lego-library-export-YYYY-MM-DD.json`
pub fn default_export_file_name(exported_at: DateTime<Utc>) -> String {
    format!(
        "lego-library-export-{}.json",
        exported_at.format("%Y-%m-%d")
    )
}
