//! Set enrichment: fills in an item's official name, theme, image and
//! product page from the catalog.
//!
//! Enrichment never fails. When the credential is missing or both lookups
//! fail, the item comes back as it went in.

mod category;
mod theme;

pub use category::{derive_category, UNCATEGORIZED};
pub use theme::{ThemeCache, MAX_THEME_DEPTH, UNKNOWN_THEME};

use crate::catalog_client::{CatalogApi, SetRecord};
use crate::item::Item;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Separator between a set number and its variant, as in `75313-1`.
const VARIANT_SEPARATOR: char = '-';
const DEFAULT_VARIANT: &str = "1";

/// Key used for the first catalog lookup of `code`.
pub fn lookup_key(code: &str) -> String {
    if code.contains(VARIANT_SEPARATOR) {
        code.to_string()
    } else {
        format!("{}{}{}", code, VARIANT_SEPARATOR, DEFAULT_VARIANT)
    }
}

pub struct Enricher {
    api: Arc<dyn CatalogApi>,
    themes: ThemeCache,
}

impl Enricher {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            themes: ThemeCache::new(),
        }
    }

    pub fn themes(&self) -> &ThemeCache {
        &self.themes
    }

    /// Returns a copy of `item` merged with catalog metadata.
    pub async fn enrich(&self, item: &Item, api_key: Option<&str>) -> Item {
        let Some(api_key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            debug!("No API key, skipping enrichment of {}", item.code);
            return item.clone();
        };

        let Some(record) = self.fetch_with_fallback(&item.code, api_key).await else {
            return item.clone();
        };

        self.merge(item, record, api_key).await
    }

    /// Enriches every item concurrently. Output order matches input order.
    pub async fn enrich_all(&self, items: &[Item], api_key: Option<&str>) -> Vec<Item> {
        info!("Enriching {} sets", items.len());
        join_all(items.iter().map(|item| self.enrich(item, api_key))).await
    }

    async fn fetch_with_fallback(&self, code: &str, api_key: &str) -> Option<SetRecord> {
        let primary_key = lookup_key(code);
        match self.api.fetch_set(&primary_key, api_key).await {
            Ok(record) => return Some(record),
            Err(e) => debug!("Lookup of {} failed ({}), retrying as {}", primary_key, e, code),
        }

        match self.api.fetch_set(code, api_key).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Could not fetch details for set {}: {}", code, e);
                None
            }
        }
    }

    async fn merge(&self, item: &Item, record: SetRecord, api_key: &str) -> Item {
        let category = match record.theme_id.filter(|id| *id != 0) {
            Some(theme_id) => Some(
                self.themes
                    .resolve(self.api.as_ref(), theme_id, api_key)
                    .await,
            ),
            None => item.category.clone(),
        };

        Item {
            resolved_name: non_empty(record.name).unwrap_or_else(|| item.resolved_name.clone()),
            category,
            image_url: non_empty(record.set_img_url),
            product_url: non_empty(record.set_url).unwrap_or_else(|| item.product_url.clone()),
            ..item.clone()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
