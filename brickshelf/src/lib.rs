//! Brickshelf keeps a local collection of construction-toy sets.
//!
//! Sets are added by catalog code, enriched with names, themes and images
//! from the Rebrickable catalog, persisted in SQLite and exchanged with
//! other installs through JSON library exports.

pub mod catalog_client;
pub mod collection;
pub mod collection_store;
pub mod config;
pub mod enrichment;
pub mod item;
pub mod library;
pub mod sqlite_persistence;
pub mod view;
