use crate::item::{default_requested_name, Item, LOADING_NAME};
use serde::{de, Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unrecognized file format: expected a library export or a \"lego_sets\" list")]
    UnknownFormat,

    #[error("Invalid library file: {0}")]
    InvalidLibrary(String),

    #[error("Invalid \"lego_sets\" list: {0}")]
    InvalidSetList(String),
}

/// A validated import file.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportDocument {
    /// A full snapshot previously written by the exporter. Items are
    /// complete and need no enrichment.
    Library {
        version: String,
        export_date: Option<String>,
        items: Vec<Item>,
    },
    /// A list of set numbers, optionally with theme, name and booklets.
    /// Items are pending until the next sync.
    SetList(Vec<Item>),
}

impl ImportDocument {
    pub fn items(&self) -> &[Item] {
        match self {
            ImportDocument::Library { items, .. } => items,
            ImportDocument::SetList(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<Item> {
        match self {
            ImportDocument::Library { items, .. } => items,
            ImportDocument::SetList(items) => items,
        }
    }
}

/// Parses and validates an import file.
///
/// The shape is chosen by which keys are present: `version` and `sets`
/// select a library export, `lego_sets` selects a set list. Validation is
/// all-or-nothing; one malformed entry rejects the whole file.
pub fn parse_import(text: &str) -> Result<ImportDocument, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(document) = value else {
        return Err(ImportError::UnknownFormat);
    };

    if document.contains_key("version") && document.contains_key("sets") {
        parse_library(document)
    } else if document.contains_key("lego_sets") {
        parse_set_list(document)
    } else {
        Err(ImportError::UnknownFormat)
    }
}

/// Older exports name `resolvedName` as `legoName` and `category` as
/// `theme`. Both spellings may appear in one entry; the current one wins.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibraryEntry {
    code: String,
    #[serde(default)]
    requested_name: Option<String>,
    #[serde(default)]
    resolved_name: Option<String>,
    #[serde(default)]
    lego_name: Option<String>,
    #[serde(default)]
    product_url: Option<String>,
    exists: bool,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

fn parse_library(mut document: Map<String, Value>) -> Result<ImportDocument, ImportError> {
    let version = match document.remove("version") {
        Some(Value::String(version)) if !version.trim().is_empty() => version,
        Some(Value::Number(version)) => version.to_string(),
        _ => return Err(ImportError::InvalidLibrary("missing version".to_string())),
    };
    let Some(Value::Array(entries)) = document.remove("sets") else {
        return Err(ImportError::InvalidLibrary(
            "\"sets\" is not an array".to_string(),
        ));
    };

    let items = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            library_entry_to_item(entry)
                .map_err(|reason| ImportError::InvalidLibrary(format!("set #{}: {}", index + 1, reason)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let export_date = document
        .get("exportDate")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(total) = document.get("totalSets").and_then(Value::as_u64) {
        if total as usize != items.len() {
            warn!(
                "Library file declares {} sets but contains {}",
                total,
                items.len()
            );
        }
    }
    info!(
        "Parsed library version {} with {} sets (exported {})",
        version,
        items.len(),
        export_date.as_deref().unwrap_or("at an unknown date")
    );

    Ok(ImportDocument::Library {
        version,
        export_date,
        items,
    })
}

fn library_entry_to_item(entry: Value) -> Result<Item, String> {
    // productUrl must be present, though it may be null or empty
    if entry.get("productUrl").is_none() {
        return Err("missing field `productUrl`".to_string());
    }
    let entry: LibraryEntry = serde_json::from_value(entry).map_err(|e| e.to_string())?;
    if entry.code.trim().is_empty() {
        return Err("empty code".to_string());
    }
    let resolved_name = entry
        .resolved_name
        .or(entry.lego_name)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| format!("set {} has an empty name", entry.code))?;

    Ok(Item {
        requested_name: entry
            .requested_name
            .unwrap_or_else(|| default_requested_name(&entry.code)),
        code: entry.code,
        resolved_name,
        product_url: entry.product_url.unwrap_or_default(),
        exists: entry.exists,
        category: entry.category.or(entry.theme),
        note: entry.note,
        image_url: entry.image_url,
    })
}

#[derive(Deserialize)]
struct SetListEntry {
    #[serde(deserialize_with = "string_or_number")]
    set_number: String,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    booklets: Vec<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

fn parse_set_list(mut document: Map<String, Value>) -> Result<ImportDocument, ImportError> {
    let Some(Value::Array(entries)) = document.remove("lego_sets") else {
        return Err(ImportError::InvalidSetList(
            "\"lego_sets\" is not an array".to_string(),
        ));
    };

    let items = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            set_list_entry_to_item(entry)
                .map_err(|reason| ImportError::InvalidSetList(format!("entry #{}: {}", index + 1, reason)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(total) = document.get("total_sets").and_then(Value::as_u64) {
        if total as usize != items.len() {
            warn!(
                "Set list declares {} sets but contains {}",
                total,
                items.len()
            );
        }
    }
    info!("Parsed set list with {} sets", items.len());
    Ok(ImportDocument::SetList(items))
}

fn set_list_entry_to_item(entry: Value) -> Result<Item, String> {
    let entry: SetListEntry = serde_json::from_value(entry).map_err(|e| e.to_string())?;
    let code = entry.set_number.trim();
    if code.is_empty() {
        return Err("empty set_number".to_string());
    }

    let theme = entry.theme.filter(|t| !t.trim().is_empty());
    let name = entry.name.filter(|n| !n.trim().is_empty());
    if theme.is_none() && name.is_none() {
        return Ok(Item::new_pending(
            code,
            default_requested_name(code),
            String::new(),
        ));
    }

    let requested_name = match (&theme, &name) {
        (Some(theme), Some(name)) => format!("LEGO {} {}: {}", theme, code, name),
        (Some(theme), None) => format!("LEGO {} {}", theme, code),
        (None, Some(name)) => format!("LEGO {}: {}", code, name),
        (None, None) => default_requested_name(code),
    };

    let mut item = Item::new_pending(code, requested_name, String::new());
    item.resolved_name = name.unwrap_or_else(|| LOADING_NAME.to_string());
    if !entry.booklets.is_empty() {
        item.note = Some(format!("Booklets: {}", entry.booklets.join(", ")));
    }
    Ok(item)
}
