//! Catalog content API client.
//!
//! Products live in the hosted content store, not in Postgres. This client
//! runs read-only queries against the content API's HTTP query endpoint and
//! keeps a short-lived in-process cache so the order endpoints don't hammer
//! the API for the same products.

use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use marigold_core::ProductId;

use crate::config::CatalogConfig;
use crate::models::ProductDoc;

/// How long a fetched product stays fresh. Price checks during checkout
/// should see catalog edits within a minute.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Maximum number of products held in the cache.
const CACHE_CAPACITY: u64 = 1_000;

/// Errors that can occur when querying the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Query response envelope from the content API.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: Option<ProductDoc>,
}

/// Read-only client for the hosted product catalog.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    query_url: String,
    cache: Cache<String, ProductDoc>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.api_token {
            let auth_value = format!("Bearer {}", token.expose_secret());
            headers.insert(
                "Authorization",
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| CatalogError::Parse(format!("Invalid API token format: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()?;

        let query_url = format!(
            "{}/data/query/{}",
            config.base_url.trim_end_matches('/'),
            config.dataset
        );

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            client,
            query_url,
            cache,
        })
    }

    /// Fetch a product by id, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response can't be parsed.
    pub async fn product(&self, id: &ProductId) -> Result<Option<ProductDoc>, CatalogError> {
        if let Some(doc) = self.cache.get(id.as_str()).await {
            return Ok(Some(doc));
        }

        let doc = self.fetch_product(id).await?;

        if let Some(doc) = &doc {
            self.cache.insert(id.as_str().to_string(), doc.clone()).await;
        }

        Ok(doc)
    }

    /// Fetch a product by id, skipping and refreshing the cache.
    ///
    /// Used by the content webhook, which must see the edit it was told about.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response can't be parsed.
    pub async fn product_uncached(
        &self,
        id: &ProductId,
    ) -> Result<Option<ProductDoc>, CatalogError> {
        let doc = self.fetch_product(id).await?;

        match &doc {
            Some(doc) => {
                self.cache.insert(id.as_str().to_string(), doc.clone()).await;
            }
            None => self.cache.invalidate(id.as_str()).await,
        }

        Ok(doc)
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<ProductDoc>, CatalogError> {
        let query = r#"*[_type == "product" && _id == $id][0]"#;
        // The parameter name is literally `$id`, percent-encoded in the URL.
        let url = format!(
            "{}?query={}&%24id={}",
            self.query_url,
            urlencoding::encode(query),
            urlencoding::encode(&format!("\"{}\"", id.as_str()))
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        Ok(body.result)
    }
}
