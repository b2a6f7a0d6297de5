//! Client for the third-party set catalog.
//!
//! The [`CatalogApi`] trait is the seam the enrichment engine talks to;
//! [`RebrickableClient`] is the HTTP implementation.

mod models;
mod rebrickable;

pub use models::{SetRecord, ThemeRecord};
pub use rebrickable::{RebrickableClient, DEFAULT_API_BASE_URL};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Catalog returned status {status}")]
    Status { status: u16 },

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Lookups against the set catalog. Every call carries the credential.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch a set by its lookup key (e.g. `75313-1`).
    async fn fetch_set(&self, key: &str, api_key: &str) -> Result<SetRecord, CatalogError>;

    /// Fetch a theme by id.
    async fn fetch_theme(&self, theme_id: i64, api_key: &str) -> Result<ThemeRecord, CatalogError>;
}
