//! SQLite schema for the collection database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

/// One row per set in the collection, keyed by catalog code.
const SETS_TABLE_V1: Table = Table {
    name: "sets",
    columns: &[
        sqlite_column!("code", &SqlType::Text, is_primary_key = true),
        sqlite_column!("requested_name", &SqlType::Text, non_null = true),
        sqlite_column!("resolved_name", &SqlType::Text, non_null = true),
        sqlite_column!("product_url", &SqlType::Text, non_null = true),
        sqlite_column!("exists_flag", &SqlType::Integer, non_null = true),
        sqlite_column!("category", &SqlType::Text),
        sqlite_column!("note", &SqlType::Text),
        sqlite_column!("image_url", &SqlType::Text),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("(cast(strftime('%s','now') as int))")
        ),
    ],
    indices: &[("idx_sets_category", "category")],
};

/// Key-value settings (the catalog API key lives here).
const SETTINGS_TABLE_V1: Table = Table {
    name: "settings",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("value", &SqlType::Text, non_null = true),
        sqlite_column!(
            "updated_at",
            &SqlType::Text,
            non_null = true,
            default_value = Some("(datetime('now'))")
        ),
    ],
    indices: &[],
};

/// Version 1: sets and settings tables.
pub const COLLECTION_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[SETS_TABLE_V1, SETTINGS_TABLE_V1],
}];
