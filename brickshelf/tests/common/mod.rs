//! Common test infrastructure
//!
//! A [`TestCollection`] is a collection service backed by a real SQLite
//! file in a temp dir and a [`FakeCatalog`] instead of the HTTP client.

#![allow(dead_code)]

use async_trait::async_trait;
use brickshelf::catalog_client::{CatalogApi, CatalogError, SetRecord, ThemeRecord};
use brickshelf::collection::CollectionService;
use brickshelf::collection_store::SqliteCollectionStore;
use brickshelf::enrichment::Enricher;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const API_KEY: &str = "test-api-key";

pub const AT_AT_CODE: &str = "75313";
pub const AT_AT_NAME: &str = "AT-AT";
pub const LAMBORGHINI_CODE: &str = "42115";
pub const LAMBORGHINI_NAME: &str = "Lamborghini Sián FKP 37";

pub const STAR_WARS_THEME_ID: i64 = 158;
pub const TECHNIC_THEME_ID: i64 = 1;

/// In-process catalog serving a fixed set of records.
#[derive(Default)]
pub struct FakeCatalog {
    sets: HashMap<String, SetRecord>,
    themes: HashMap<i64, ThemeRecord>,
}

impl FakeCatalog {
    /// Two sets under two root themes.
    pub fn standard() -> Self {
        let mut catalog = FakeCatalog::default();
        catalog.add_set(AT_AT_CODE, AT_AT_NAME, STAR_WARS_THEME_ID);
        catalog.add_set(LAMBORGHINI_CODE, LAMBORGHINI_NAME, TECHNIC_THEME_ID);
        catalog.themes.insert(
            STAR_WARS_THEME_ID,
            ThemeRecord {
                name: Some("Star Wars".to_string()),
                parent_id: None,
            },
        );
        catalog.themes.insert(
            TECHNIC_THEME_ID,
            ThemeRecord {
                name: Some("Technic".to_string()),
                parent_id: None,
            },
        );
        catalog
    }

    fn add_set(&mut self, code: &str, name: &str, theme_id: i64) {
        let key = format!("{}-1", code);
        self.sets.insert(
            key.clone(),
            SetRecord {
                name: Some(name.to_string()),
                theme_id: Some(theme_id),
                set_img_url: Some(format!("https://cdn.rebrickable.com/media/sets/{}.jpg", key)),
                set_url: Some(format!("https://rebrickable.com/sets/{}/", key)),
            },
        );
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn fetch_set(&self, key: &str, api_key: &str) -> Result<SetRecord, CatalogError> {
        if api_key != API_KEY {
            return Err(CatalogError::Status { status: 401 });
        }
        self.sets
            .get(key)
            .cloned()
            .ok_or(CatalogError::Status { status: 404 })
    }

    async fn fetch_theme(&self, theme_id: i64, api_key: &str) -> Result<ThemeRecord, CatalogError> {
        if api_key != API_KEY {
            return Err(CatalogError::Status { status: 401 });
        }
        self.themes
            .get(&theme_id)
            .cloned()
            .ok_or(CatalogError::Status { status: 404 })
    }
}

pub struct TestCollection {
    pub service: CollectionService,
    pub db_path: PathBuf,
    pub temp_dir: TempDir,
}

impl TestCollection {
    /// A fresh, empty collection with the test API key configured.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("collection.db");
        let service = open_service(&db_path, Some(API_KEY.to_string()));
        TestCollection {
            service,
            db_path,
            temp_dir,
        }
    }

    /// A second service over the same database, as after a restart.
    pub fn reopen(&self) -> CollectionService {
        let mut service = open_service(&self.db_path, Some(API_KEY.to_string()));
        service.load().expect("Failed to load collection");
        service
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.temp_dir.path().join(file_name)
    }
}

pub fn open_service(db_path: &Path, api_key: Option<String>) -> CollectionService {
    let store = Arc::new(SqliteCollectionStore::new(db_path).expect("Failed to open store"));
    let enricher = Enricher::new(Arc::new(FakeCatalog::standard()));
    CollectionService::new(store.clone(), store, enricher, api_key)
}
