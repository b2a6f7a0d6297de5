//! The collection as the user sees it: an in-memory list of items kept in
//! step with the store, plus the operations the shell exposes.

use crate::collection_store::{CollectionStore, SettingsStore};
use crate::enrichment::Enricher;
use crate::item::{default_product_url, default_requested_name, Item};
use crate::library::{
    default_export_file_name, export_library, parse_import, plan_merge, ExportError, ImportError,
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Set code must not be empty")]
    EmptyCode,

    #[error("API key must not be empty")]
    EmptyApiKey,

    #[error("Set {0} is not in the collection")]
    NotFound(String),

    #[error("No sets found in the file")]
    NoSetsInImport,

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added {
        item: Item,
        /// False when no API key was available and the catalog was not asked.
        enriched: bool,
    },
    AlreadyExists(Item),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub total: usize,
    /// Items whose stored record changed.
    pub updated: usize,
    pub enrichment_skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { added: usize, duplicates: usize },
    NothingNew { duplicates: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyStatus {
    /// Saved in the collection database. Holds the masked key.
    Stored(String),
    /// Taken from the configuration. Holds the masked key.
    Configured(String),
    Missing,
}

/// Hides all but the last four characters of a credential.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.filter(|key| !key.trim().is_empty())
}

pub struct CollectionService {
    store: Arc<dyn CollectionStore>,
    settings: Arc<dyn SettingsStore>,
    enricher: Enricher,
    configured_api_key: Option<String>,
    items: Vec<Item>,
}

impl CollectionService {
    pub fn new(
        store: Arc<dyn CollectionStore>,
        settings: Arc<dyn SettingsStore>,
        enricher: Enricher,
        configured_api_key: Option<String>,
    ) -> Self {
        Self {
            store,
            settings,
            enricher,
            configured_api_key,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, code: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.code == code.trim())
    }

    /// Reads the collection from the store.
    ///
    /// On failure the in-memory collection is emptied and the error is
    /// returned for the caller to report.
    pub fn load(&mut self) -> Result<usize, CollectionError> {
        match self.store.get_all() {
            Ok(items) => {
                info!("Loaded {} sets", items.len());
                self.items = items;
                Ok(self.items.len())
            }
            Err(e) => {
                error!("Failed to load the collection: {:#}", e);
                self.items.clear();
                Err(e.into())
            }
        }
    }

    /// Credential used for catalog lookups: the stored one, else the
    /// configured one.
    pub fn effective_api_key(&self) -> Option<String> {
        let stored = self.settings.get_api_key().unwrap_or_else(|e| {
            warn!("Failed to read the stored API key: {:#}", e);
            None
        });
        non_blank(stored).or_else(|| non_blank(self.configured_api_key.clone()))
    }

    /// Adds a set by code.
    ///
    /// The new item is shown immediately as pending, enriched, then saved.
    /// If saving fails the pending item is withdrawn.
    pub async fn add(
        &mut self,
        code: &str,
        product_url: Option<&str>,
    ) -> Result<AddOutcome, CollectionError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CollectionError::EmptyCode);
        }
        if let Some(existing) = self.store.get(code)? {
            return Ok(AddOutcome::AlreadyExists(existing));
        }
        if let Some(existing) = self.get(code) {
            return Ok(AddOutcome::AlreadyExists(existing.clone()));
        }

        let product_url = product_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_product_url(code));
        let pending = Item::new_pending(code, default_requested_name(code), product_url);
        self.items.insert(0, pending.clone());

        let api_key = self.effective_api_key();
        let item = self.enricher.enrich(&pending, api_key.as_deref()).await;

        if let Err(e) = self.store.put(&item) {
            error!("Failed to save set {}: {:#}", code, e);
            self.items.retain(|i| i.code != code);
            return Err(e.into());
        }

        if let Some(slot) = self.items.iter_mut().find(|i| i.code == code) {
            *slot = item.clone();
        }
        info!("Added set {}", code);
        Ok(AddOutcome::Added {
            item,
            enriched: api_key.is_some(),
        })
    }

    /// Re-enriches every stored item and saves them in one batch.
    ///
    /// The in-memory collection only changes once the batch is saved.
    pub async fn sync(&mut self) -> Result<SyncReport, CollectionError> {
        let current = self.store.get_all()?;
        let api_key = self.effective_api_key();
        let enriched = self
            .enricher
            .enrich_all(&current, api_key.as_deref())
            .await;

        let updated = current
            .iter()
            .zip(enriched.iter())
            .filter(|(before, after)| before != after)
            .count();

        self.store.put_many(&enriched)?;
        self.items = enriched;
        info!("Synced {} sets, {} updated", self.items.len(), updated);

        Ok(SyncReport {
            total: self.items.len(),
            updated,
            enrichment_skipped: api_key.is_none(),
        })
    }

    pub fn delete(&mut self, code: &str) -> Result<Item, CollectionError> {
        let code = code.trim();
        let Some(item) = self.store.get(code)? else {
            return Err(CollectionError::NotFound(code.to_string()));
        };
        self.store.delete(code)?;
        self.items.retain(|i| i.code != code);
        info!("Deleted set {}", code);
        Ok(item)
    }

    /// Removes every set. Settings are kept.
    pub fn clear(&mut self) -> Result<usize, CollectionError> {
        self.store.clear()?;
        let removed = self.items.len();
        self.items.clear();
        Ok(removed)
    }

    /// Merges a library export or set list into the collection. Codes
    /// already present are skipped.
    pub fn import_json(&mut self, text: &str) -> Result<ImportOutcome, CollectionError> {
        let imported = parse_import(text)?.into_items();
        if imported.is_empty() {
            return Err(CollectionError::NoSetsInImport);
        }

        let existing = self.store.get_all()?;
        let plan = plan_merge(&existing, imported);
        if plan.is_empty() {
            info!(
                "Import skipped, all {} sets already exist",
                plan.duplicate_count
            );
            return Ok(ImportOutcome::NothingNew {
                duplicates: plan.duplicate_count,
            });
        }

        let added = plan.new_items.len();
        let mut merged = existing;
        merged.extend(plan.new_items);
        self.store.put_many(&merged)?;
        self.items = merged;

        info!(
            "Imported {} sets, {} duplicates skipped",
            added, plan.duplicate_count
        );
        Ok(ImportOutcome::Imported {
            added,
            duplicates: plan.duplicate_count,
        })
    }

    pub async fn import_file(&mut self, path: &Path) -> Result<ImportOutcome, CollectionError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CollectionError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        self.import_json(&text)
    }

    pub fn export_json(&self) -> Result<String, CollectionError> {
        Ok(export_library(&self.items, Utc::now())?)
    }

    /// Writes the export to `path`, or to the dated default file name in
    /// the working directory. Returns where it was written.
    pub async fn export_file(&self, path: Option<&Path>) -> Result<PathBuf, CollectionError> {
        let now = Utc::now();
        let json = export_library(&self.items, now)?;
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(default_export_file_name(now)));

        tokio::fs::write(&path, json)
            .await
            .map_err(|source| CollectionError::Io {
                path: path.clone(),
                source,
            })?;
        info!("Exported {} sets to {:?}", self.items.len(), path);
        Ok(path)
    }

    pub fn set_api_key(&self, api_key: &str) -> Result<(), CollectionError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(CollectionError::EmptyApiKey);
        }
        self.settings.save_api_key(api_key)?;
        Ok(())
    }

    pub fn api_key_status(&self) -> Result<ApiKeyStatus, CollectionError> {
        if let Some(stored) = non_blank(self.settings.get_api_key()?) {
            return Ok(ApiKeyStatus::Stored(mask_api_key(&stored)));
        }
        Ok(match non_blank(self.configured_api_key.clone()) {
            Some(configured) => ApiKeyStatus::Configured(mask_api_key(&configured)),
            None => ApiKeyStatus::Missing,
        })
    }

    pub fn delete_api_key(&self) -> Result<(), CollectionError> {
        self.settings.delete_api_key()?;
        Ok(())
    }
}
