//! HTTP client for the Rebrickable catalog API.

use super::models::{SetRecord, ThemeRecord};
use super::{CatalogApi, CatalogError};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "https://rebrickable.com/api/v3/lego";

pub struct RebrickableClient {
    client: reqwest::Client,
    base_url: Url,
}

impl RebrickableClient {
    /// Create a new catalog client.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. "https://rebrickable.com/api/v3/lego"
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: &str, timeout_sec: u64) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid catalog URL {}", base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("Catalog URL {} cannot be used as a base", base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Builds `{base}/{segments...}/`. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::Connection(format!("Invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, api_key: &str) -> Result<T, CatalogError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("key {}", api_key))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout
                } else {
                    CatalogError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::RateLimited);
        }
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl CatalogApi for RebrickableClient {
    async fn fetch_set(&self, key: &str, api_key: &str) -> Result<SetRecord, CatalogError> {
        let url = self.endpoint(&["sets", key])?;
        self.get_json(url, api_key).await
    }

    async fn fetch_theme(&self, theme_id: i64, api_key: &str) -> Result<ThemeRecord, CatalogError> {
        let url = self.endpoint(&["themes", &theme_id.to_string()])?;
        self.get_json(url, api_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_endpoint() {
        let client = RebrickableClient::new(DEFAULT_API_BASE_URL, 30).unwrap();
        let url = client.endpoint(&["sets", "75313-1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://rebrickable.com/api/v3/lego/sets/75313-1/"
        );
    }

    #[test]
    fn test_theme_endpoint_with_trailing_slash_base() {
        let client = RebrickableClient::new("http://localhost:8080/lego/", 5).unwrap();
        let url = client.endpoint(&["themes", "158"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/lego/themes/158/");
    }

    #[test]
    fn test_endpoint_encodes_codes() {
        let client = RebrickableClient::new(DEFAULT_API_BASE_URL, 30).unwrap();
        let url = client.endpoint(&["sets", "a b/c"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://rebrickable.com/api/v3/lego/sets/a%20b%2Fc/"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(RebrickableClient::new("not a url", 30).is_err());
        assert!(RebrickableClient::new("mailto:someone@example.com", 30).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let client = RebrickableClient::new("http://127.0.0.1:9/lego", 2).unwrap();
        let err = client.fetch_set("75313-1", "key").await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Connection(_) | CatalogError::Timeout
        ));
    }
}
