use async_trait::async_trait;
use catalog::domain::CacheEntry;
use catalog::ports::{EntryStore, EntryUpdate, SeedFuture};
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use shared::Result;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// Moka-based entry store.
/// Entries never expire on their own; staleness is the cache's business, not the store's.
/// With `max_entries` set, moka evicts the least valuable keys past that bound.
pub struct MokaEntryStore<T>
where
    T: Send + Sync + 'static,
{
    name: String,
    cache: Cache<String, CacheEntry<T>>,
}

impl<T> MokaEntryStore<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, max_entries: Option<u64>) -> Self {
        let name = name.into();
        let mut builder = Cache::builder().name(&name);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            name,
            cache: builder.build(),
        }
    }

    /// Create an unbounded store
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }
}

#[async_trait]
impl<T> EntryStore<T> for MokaEntryStore<T>
where
    T: Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        self.cache.get(key).await
    }

    async fn get_or_seed(&self, key: &str, seed: SeedFuture<T>) -> Result<CacheEntry<T>> {
        // try_get_with coalesces concurrent initialisations of the same key
        // and does not insert anything when the seed fails.
        self.cache
            .try_get_with(key.to_string(), seed)
            .await
            .map_err(|e| (*e).clone())
    }

    async fn update(&self, key: &str, update: EntryUpdate<T>) -> bool {
        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|current| {
                let op = match update(current.as_ref().map(|entry| entry.value())) {
                    Some(next) => Op::Put(next),
                    None => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;

        let written = matches!(result, CompResult::Inserted(_) | CompResult::ReplacedWith(_));
        debug!("{} store: update of '{}' written={}", self.name, key, written);
        written
    }

    async fn entries(&self) -> Vec<(String, CacheEntry<T>)> {
        self.cache
            .iter()
            .map(|(key, entry)| ((*key).clone(), entry))
            .collect()
    }

    async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl<T> Debug for MokaEntryStore<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaEntryStore")
            .field("name", &self.name)
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
