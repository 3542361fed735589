use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::TimestampMs;
use std::sync::Arc;

/// Stock state as reported by the catalog API (`estado`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum StockState {
    #[default]
    Unavailable,
    Limited,
    Available,
    Other(i64),
}

impl From<i64> for StockState {
    fn from(value: i64) -> Self {
        match value {
            0 => StockState::Unavailable,
            1 => StockState::Limited,
            2 => StockState::Available,
            other => StockState::Other(other),
        }
    }
}

impl From<StockState> for i64 {
    fn from(value: StockState) -> Self {
        match value {
            StockState::Unavailable => 0,
            StockState::Limited => 1,
            StockState::Available => 2,
            StockState::Other(other) => other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "id_marca", default)]
    pub brand_id: String,
    #[serde(rename = "id_categoria", default)]
    pub category_id: String,
    #[serde(rename = "codigo", default)]
    pub code: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "precio", default)]
    pub price: f64,
    #[serde(rename = "unidad_medida", default)]
    pub unit: String,
    #[serde(rename = "estado", default)]
    pub stock: StockState,
    #[serde(rename = "galeria", default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "vistas", default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(rename = "cantidad_vistas", default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(rename = "garantia", default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<f64>,
    #[serde(rename = "ficha_tecnica", default, skip_serializing_if = "Option::is_none")]
    pub datasheet_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Product {
    /// Minimal product, mostly useful for fixtures.
    pub fn new(id: impl Into<String>, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            brand_id: String::new(),
            category_id: String::new(),
            code: String::new(),
            name: name.into(),
            description: String::new(),
            price: 0.0,
            unit: String::new(),
            stock: StockState::default(),
            gallery: Vec::new(),
            slug: slug.into(),
            created_at: None,
            views: None,
            view_count: None,
            warranty: None,
            datasheet_url: None,
            url: None,
        }
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.gallery.first().map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "nombre", default)]
    pub name: String,
    // Attributes the cache does not interpret, kept so they survive a round trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Where a cache instance runs: a one-shot server render or a long-lived client session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderContext {
    Server,
    Client,
}

impl RenderContext {
    pub fn is_server(self) -> bool {
        matches!(self, RenderContext::Server)
    }
}

/// The upstream resources the cache knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Products,
    Categories,
    ProductBySlug,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Categories => "categories",
            Resource::ProductBySlug => "product_by_slug",
        }
    }
}

/// One cached list plus its freshness bookkeeping.
///
/// `refreshed_at` drives staleness. `requested_at` is when the request that produced
/// `data` was issued; writes carrying an older `requested_at` are discarded.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub data: Arc<Vec<T>>,
    pub refreshed_at: TimestampMs,
    pub requested_at: TimestampMs,
}

impl<T> CacheEntry<T> {
    pub fn new(data: Vec<T>, requested_at: TimestampMs, refreshed_at: TimestampMs) -> Self {
        Self {
            data: Arc::new(data),
            refreshed_at,
            requested_at,
        }
    }

    pub fn is_stale(&self, now: TimestampMs, refresh_interval_ms: u64) -> bool {
        self.refreshed_at.elapsed_until(now) > refresh_interval_ms
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            refreshed_at: self.refreshed_at,
            requested_at: self.requested_at,
        }
    }
}

pub mod response {
    use super::{Category, Product};
    use serde::{Deserialize, Serialize};

    pub const FOUND_IN_CACHE: &str = "Producto encontrado en cache";
    pub const LOOKUP_FAILED: &str = "Error al obtener el producto";

    /// Result of a by-slug lookup. `correct == false` carries a message for the caller to show.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct SlugLookup {
        pub correct: bool,
        pub message: String,
        pub product: Option<Product>,
    }

    impl SlugLookup {
        pub fn found(product: Product, message: impl Into<String>) -> Self {
            Self {
                correct: true,
                message: message.into(),
                product: Some(product),
            }
        }

        pub fn failed(message: impl Into<String>) -> Self {
            Self {
                correct: false,
                message: message.into(),
                product: None,
            }
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct ForcedRefresh {
        pub products: Vec<Product>,
        pub categories: Vec<Category>,
    }
}
