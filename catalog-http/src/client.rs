use crate::api::{ListEnvelope, SlugEnvelope};
use async_trait::async_trait;
use catalog::ports::CatalogApi;
use catalog::{Category, Product, SlugLookup};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use shared::config::Config;
use shared::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

const PRODUCTS_PATH: &str = "obtener-productos";
const CATEGORIES_PATH: &str = "obtener-categorias";
const PRODUCT_BY_SLUG_PATH: &str = "obtener-producto-slug";

/// [`CatalogApi`] over the upstream REST endpoints.
#[derive(Clone, Debug)]
pub struct ReqwestCatalogApi {
    client: Client,
    base: Url,
}

impl ReqwestCatalogApi {
    /// `base_url` is the full prefix the endpoint names are appended to,
    /// e.g. `http://localhost:3000/api/eprovet/`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::InvalidConfig(format!("invalid API url '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "API url '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base(), config.http_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append `endpoint` and `key` to the base, percent-encoding the key as a single segment.
    fn endpoint(&self, endpoint: &str, key: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidConfig(format!("API url '{}' cannot carry a path", self.base)))?
            .pop_if_empty()
            .push(endpoint)
            .push(key);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| fetch_failed(&url, e))?;

        response.json::<T>().await.map_err(|e| fetch_failed(&url, e))
    }
}

fn fetch_failed(url: &Url, e: reqwest::Error) -> Error {
    warn!("Request to {} failed: {}", url, e);
    Error::FetchFailed(format!("{}: {}", url, e))
}

#[async_trait]
impl CatalogApi for ReqwestCatalogApi {
    async fn products(&self, brand_id: &str) -> Result<Vec<Product>> {
        let url = self.endpoint(PRODUCTS_PATH, brand_id)?;
        let envelope: ListEnvelope<Product> = self.get_json(url).await?;
        Ok(envelope.data)
    }

    async fn categories(&self, brand_id: &str) -> Result<Vec<Category>> {
        let url = self.endpoint(CATEGORIES_PATH, brand_id)?;
        let envelope: ListEnvelope<Category> = self.get_json(url).await?;
        Ok(envelope.data)
    }

    async fn product_by_slug(&self, slug: &str) -> Result<SlugLookup> {
        let url = self.endpoint(PRODUCT_BY_SLUG_PATH, slug)?;
        let envelope: SlugEnvelope = self.get_json(url).await?;
        Ok(envelope.into())
    }
}
