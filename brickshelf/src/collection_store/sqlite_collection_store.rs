use super::schema::COLLECTION_VERSIONED_SCHEMAS;
use super::{CollectionStore, SettingsStore};
use crate::item::Item;
use crate::sqlite_persistence::VersionedSchema;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Settings key under which the catalog API credential is stored.
pub const API_KEY_SETTING: &str = "rebrickable_api_key";

const ITEM_COLUMNS: &str =
    "code, requested_name, resolved_name, product_url, exists_flag, category, note, image_url";

pub struct SqliteCollectionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCollectionStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open collection database at {:?}", path))?;

        if is_new_db {
            info!("Creating new collection database at {:?}", path);
            Self::latest_schema()?.create(&conn)?;
        } else {
            let db_version = VersionedSchema::stored_version(&conn)?;
            if db_version < 1 {
                bail!(
                    "Collection database version {} is invalid (expected >= 1)",
                    db_version
                );
            }

            let schema = COLLECTION_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version as i64 == db_version)
                .with_context(|| format!("Unknown collection database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Collection database schema validation failed for version {}",
                    db_version
                )
            })?;
            debug!("Opened collection database version {}", db_version);
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// A throwaway store that lives only as long as the process.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::latest_schema()?.create(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn latest_schema() -> Result<&'static VersionedSchema> {
        COLLECTION_VERSIONED_SCHEMAS
            .last()
            .context("No collection schema defined")
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
        Ok(Item {
            code: row.get("code")?,
            requested_name: row.get("requested_name")?,
            resolved_name: row.get("resolved_name")?,
            product_url: row.get("product_url")?,
            exists: row.get::<_, i64>("exists_flag")? != 0,
            category: row.get("category")?,
            note: row.get("note")?,
            image_url: row.get("image_url")?,
        })
    }

    fn upsert(conn: &Connection, item: &Item) -> rusqlite::Result<usize> {
        conn.execute(
            &format!(
                "INSERT INTO sets ({ITEM_COLUMNS}, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(code) DO UPDATE SET
                    requested_name = ?2, resolved_name = ?3, product_url = ?4,
                    exists_flag = ?5, category = ?6, note = ?7, image_url = ?8,
                    updated_at = ?9"
            ),
            params![
                item.code,
                item.requested_name,
                item.resolved_name,
                item.product_url,
                item.exists as i64,
                item.category,
                item.note,
                item.image_url,
                Utc::now().timestamp(),
            ],
        )
    }
}

impl CollectionStore for SqliteCollectionStore {
    fn get_all(&self) -> Result<Vec<Item>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM sets ORDER BY code"))?;
        let items = stmt
            .query_map([], Self::row_to_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    fn get(&self, code: &str) -> Result<Option<Item>> {
        let conn = self.conn();
        let item = conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM sets WHERE code = ?1"),
                params![code],
                Self::row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    fn put(&self, item: &Item) -> Result<()> {
        let conn = self.conn();
        Self::upsert(&conn, item).with_context(|| format!("Failed to save set {}", item.code))?;
        Ok(())
    }

    fn put_many(&self, items: &[Item]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for item in items {
            Self::upsert(&tx, item).with_context(|| format!("Failed to save set {}", item.code))?;
        }
        tx.commit()?;
        debug!("Saved {} sets", items.len());
        Ok(())
    }

    fn delete(&self, code: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM sets WHERE code = ?1", params![code])?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn();
        let removed = conn.execute("DELETE FROM sets", [])?;
        info!("Cleared {} sets from the collection", removed);
        Ok(())
    }
}

impl SettingsStore for SqliteCollectionStore {
    fn get_api_key(&self) -> Result<Option<String>> {
        let conn = self.conn();
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![API_KEY_SETTING],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save_api_key(&self, api_key: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![API_KEY_SETTING, api_key],
        )?;
        Ok(())
    }

    fn delete_api_key(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM settings WHERE key = ?1",
            params![API_KEY_SETTING],
        )?;
        Ok(())
    }
}
