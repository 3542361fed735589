//! Server-to-client snapshot handoff.
//!
//! A server render records every list it fetched; the snapshot is serialised into the
//! initial response and parsed once when the client session starts. Each section is
//! drained the first time the client reads it, so a later read goes to the cache instead.

use crate::domain::{Category, Product};
use serde::{Deserialize, Serialize};
use shared::{Error, Result, TimestampMs};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffSnapshot {
    #[serde(rename = "productos", default)]
    pub products: HashMap<String, Vec<Product>>,
    #[serde(rename = "categorias", default)]
    pub categories: HashMap<String, Vec<Category>>,
    #[serde(rename = "lastUpdate", default)]
    pub products_updated: HashMap<String, TimestampMs>,
    #[serde(rename = "lastUpdateCategorias", default)]
    pub categories_updated: HashMap<String, TimestampMs>,
}

impl HandoffSnapshot {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.categories.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Handoff {
    snapshot: Mutex<HandoffSnapshot>,
}

impl Handoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: HandoffSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    /// Parse a blob produced by [`Handoff::to_blob`]. A malformed blob yields an empty handoff.
    pub fn from_blob(blob: &str) -> Self {
        if blob.trim().is_empty() {
            return Self::new();
        }
        match serde_json::from_str::<HandoffSnapshot>(blob) {
            Ok(snapshot) => {
                debug!(
                    "Loaded handoff snapshot: {} product list(s), {} category list(s)",
                    snapshot.products.len(),
                    snapshot.categories.len()
                );
                Self::from_snapshot(snapshot)
            }
            Err(e) => {
                warn!("Ignoring malformed handoff snapshot: {}", e);
                Self::new()
            }
        }
    }

    pub fn to_blob(&self) -> Result<String> {
        serde_json::to_string(&*self.lock())
            .map_err(|e| Error::Internal(format!("failed to serialise handoff: {e}")))
    }

    pub fn snapshot(&self) -> HandoffSnapshot {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn record_products(&self, brand_id: &str, products: &[Product], at: TimestampMs) {
        let mut snapshot = self.lock();
        snapshot
            .products
            .insert(brand_id.to_string(), products.to_vec());
        snapshot.products_updated.insert(brand_id.to_string(), at);
    }

    pub fn record_categories(&self, brand_id: &str, categories: &[Category], at: TimestampMs) {
        let mut snapshot = self.lock();
        snapshot
            .categories
            .insert(brand_id.to_string(), categories.to_vec());
        snapshot.categories_updated.insert(brand_id.to_string(), at);
    }

    /// Remove and return the product section for `brand_id` with its capture time.
    pub fn take_products(&self, brand_id: &str) -> Option<(Vec<Product>, Option<TimestampMs>)> {
        let mut snapshot = self.lock();
        let products = snapshot.products.remove(brand_id)?;
        let at = snapshot.products_updated.remove(brand_id);
        Some((products, at))
    }

    pub fn take_categories(&self, brand_id: &str) -> Option<(Vec<Category>, Option<TimestampMs>)> {
        let mut snapshot = self.lock();
        let categories = snapshot.categories.remove(brand_id)?;
        let at = snapshot.categories_updated.remove(brand_id);
        Some((categories, at))
    }

    /// Look for a product by slug in every section not yet drained.
    pub fn find_product(&self, slug: &str) -> Option<Product> {
        self.lock()
            .products
            .values()
            .flat_map(|products| products.iter())
            .find(|p| p.slug == slug)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HandoffSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
