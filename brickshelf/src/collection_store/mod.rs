//! Local persistence for the collection and its settings.

mod schema;
mod sqlite_collection_store;

pub use schema::COLLECTION_VERSIONED_SCHEMAS;
pub use sqlite_collection_store::{SqliteCollectionStore, API_KEY_SETTING};

use crate::item::Item;
use anyhow::Result;

/// Keyed store of collection items. `code` is the key; writes are
/// last-writer-wins per key.
pub trait CollectionStore: Send + Sync {
    /// All items, ordered by code.
    fn get_all(&self) -> Result<Vec<Item>>;
    fn get(&self, code: &str) -> Result<Option<Item>>;
    /// Insert or replace a single item.
    fn put(&self, item: &Item) -> Result<()>;
    /// Insert or replace several items in one transaction.
    fn put_many(&self, items: &[Item]) -> Result<()>;
    fn delete(&self, code: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Single-scalar settings storage holding the catalog API credential.
pub trait SettingsStore: Send + Sync {
    fn get_api_key(&self) -> Result<Option<String>>;
    fn save_api_key(&self, api_key: &str) -> Result<()>;
    fn delete_api_key(&self) -> Result<()>;
}
