#![deny(clippy::all)]

use crate::domain::response::SlugLookup;
use crate::domain::{CacheEntry, Category, Product};
use async_trait::async_trait;
use futures::future::BoxFuture;
use shared::{Result, TimestampMs};

// Ports are the pluggable seams between the cache and the outside world

/// Port for the upstream catalog REST API
#[async_trait]
pub trait CatalogApi: Send + Sync + 'static {
    /// `GET {base}/obtener-productos/{brand_id}`
    async fn products(&self, brand_id: &str) -> Result<Vec<Product>>;

    /// `GET {base}/obtener-categorias/{brand_id}`
    async fn categories(&self, brand_id: &str) -> Result<Vec<Category>>;

    /// `GET {base}/obtener-producto-slug/{slug}`
    ///
    /// A reachable API that answers `correcto: false` is not an error; it comes back as a
    /// failed [`SlugLookup`] with the upstream message.
    async fn product_by_slug(&self, slug: &str) -> Result<SlugLookup>;
}

/// Future that produces the first entry for a key.
pub type SeedFuture<T> = BoxFuture<'static, Result<CacheEntry<T>>>;

/// Computes the next entry from the current one; `None` leaves the key untouched.
pub type EntryUpdate<T> = Box<dyn FnOnce(Option<&CacheEntry<T>>) -> Option<CacheEntry<T>> + Send>;

/// Port for the keyed entry storage backing one resource
#[async_trait]
pub trait EntryStore<T>: Send + Sync + 'static
where
    T: Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<CacheEntry<T>>;

    /// Return the entry for `key`, running `seed` when it is absent.
    /// Concurrent callers for the same key share one seed; a failed seed leaves the key absent.
    async fn get_or_seed(&self, key: &str, seed: SeedFuture<T>) -> Result<CacheEntry<T>>;

    /// Atomically apply `update` to the entry for `key`. Returns whether a value was written.
    async fn update(&self, key: &str, update: EntryUpdate<T>) -> bool;

    /// Snapshot of every entry currently held.
    async fn entries(&self) -> Vec<(String, CacheEntry<T>)>;

    async fn entry_count(&self) -> u64;
}

/// Port for wall-clock time in milliseconds
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> TimestampMs;
}
