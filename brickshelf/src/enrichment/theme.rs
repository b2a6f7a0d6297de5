//! Theme id to display-name resolution.

use crate::catalog_client::CatalogApi;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Name given to themes that could not be resolved.
pub const UNKNOWN_THEME: &str = "Unknown";

/// Longest parent chain followed before giving up.
pub const MAX_THEME_DEPTH: usize = 16;

/// Session-lived memo of theme id to the name of its root ancestor.
///
/// Entries are never invalidated. Failed lookups are cached as
/// [`UNKNOWN_THEME`] and are not retried. Two resolutions racing on the
/// same id may both hit the network; the last write wins.
#[derive(Default)]
pub struct ThemeCache {
    names: Mutex<HashMap<i64, String>>,
}

impl ThemeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, theme_id: i64) -> Option<String> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&theme_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.names.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves `theme_id` to the name of the top of its parent chain.
    ///
    /// Every id walked on the way up is cached with the same name.
    pub async fn resolve(&self, api: &dyn CatalogApi, theme_id: i64, api_key: &str) -> String {
        if let Some(name) = self.cached(theme_id) {
            return name;
        }

        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = theme_id;

        let resolved = loop {
            if let Some(name) = self.cached(current) {
                break name;
            }
            if !visited.insert(current) {
                warn!("Theme {} has a cyclic parent chain", theme_id);
                break UNKNOWN_THEME.to_string();
            }
            if chain.len() >= MAX_THEME_DEPTH {
                warn!(
                    "Theme {} parent chain is deeper than {}",
                    theme_id, MAX_THEME_DEPTH
                );
                break UNKNOWN_THEME.to_string();
            }
            chain.push(current);

            match api.fetch_theme(current, api_key).await {
                Ok(record) => match record.parent_id.filter(|id| *id != 0) {
                    Some(parent_id) => current = parent_id,
                    None => {
                        break record
                            .name
                            .filter(|name| !name.trim().is_empty())
                            .unwrap_or_else(|| UNKNOWN_THEME.to_string())
                    }
                },
                Err(e) => {
                    warn!("Failed to fetch theme {}: {}", current, e);
                    break UNKNOWN_THEME.to_string();
                }
            }
        };

        debug!("Theme {} resolved to {:?} via {:?}", theme_id, resolved, chain);
        let mut names = self.names.lock().unwrap_or_else(PoisonError::into_inner);
        for id in chain {
            names.insert(id, resolved.clone());
        }
        resolved
    }
}
