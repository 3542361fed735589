#![allow(dead_code)]

use async_trait::async_trait;
use catalog::events::{CatalogEvent, UpdateSource};
use catalog::ports::{CatalogApi, EntryStore};
use catalog::{CatalogCache, Category, ManualClock, Product, RenderContext, SlugLookup};
use shared::{Error, Result, TimestampMs};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage_engine::MokaEntryStore;
use tokio::sync::{broadcast, Notify};

pub const INTERVAL_MS: u64 = 5000;

/// Scripted upstream API that counts every call.
#[derive(Default)]
pub struct FakeApi {
    products: Mutex<HashMap<String, Vec<Product>>>,
    categories: Mutex<HashMap<String, Vec<Category>>>,
    slugs: Mutex<HashMap<String, Product>>,
    fail_products: AtomicBool,
    fail_categories: AtomicBool,
    fail_slugs: AtomicBool,
    delay: Mutex<Duration>,
    products_gate: Mutex<Option<Arc<Notify>>>,
    product_calls: AtomicUsize,
    category_calls: AtomicUsize,
    slug_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_products(&self, brand_id: &str, products: Vec<Product>) {
        self.products.lock().unwrap().insert(brand_id.to_string(), products);
    }

    pub fn set_categories(&self, brand_id: &str, categories: Vec<Category>) {
        self.categories.lock().unwrap().insert(brand_id.to_string(), categories);
    }

    pub fn set_slug(&self, product: Product) {
        self.slugs.lock().unwrap().insert(product.slug.clone(), product);
    }

    pub fn fail_products(&self, fail: bool) {
        self.fail_products.store(fail, Ordering::SeqCst);
    }

    pub fn fail_categories(&self, fail: bool) {
        self.fail_categories.store(fail, Ordering::SeqCst);
    }

    pub fn fail_slugs(&self, fail: bool) {
        self.fail_slugs.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// The next products call captures its data, then waits until the returned gate is notified.
    pub fn hold_next_products_call(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.products_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    pub fn category_calls(&self) -> usize {
        self.category_calls.load(Ordering::SeqCst)
    }

    pub fn slug_calls(&self) -> usize {
        self.slug_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CatalogApi for FakeApi {
    async fn products(&self, brand_id: &str) -> Result<Vec<Product>> {
        let data = self.products.lock().unwrap().get(brand_id).cloned().unwrap_or_default();
        let gate = self.products_gate.lock().unwrap().take();
        self.product_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.pause().await;

        if self.fail_products.load(Ordering::SeqCst) {
            return Err(Error::FetchFailed(format!("obtener-productos/{brand_id}: 500")));
        }
        Ok(data)
    }

    async fn categories(&self, brand_id: &str) -> Result<Vec<Category>> {
        self.category_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.fail_categories.load(Ordering::SeqCst) {
            return Err(Error::FetchFailed(format!("obtener-categorias/{brand_id}: 500")));
        }
        Ok(self.categories.lock().unwrap().get(brand_id).cloned().unwrap_or_default())
    }

    async fn product_by_slug(&self, slug: &str) -> Result<SlugLookup> {
        self.slug_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.fail_slugs.load(Ordering::SeqCst) {
            return Err(Error::FetchFailed(format!("obtener-producto-slug/{slug}: timeout")));
        }
        Ok(match self.slugs.lock().unwrap().get(slug) {
            Some(product) => SlugLookup::found(product.clone(), "Producto encontrado"),
            None => SlugLookup::failed("Producto no encontrado"),
        })
    }
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub clock: ManualClock,
    pub products: Arc<dyn EntryStore<Product>>,
    pub categories: Arc<dyn EntryStore<Category>>,
    pub cache: CatalogCache,
}

impl Harness {
    pub fn client() -> Self {
        Self::with_context(RenderContext::Client, Arc::new(catalog::Handoff::new()))
    }

    pub fn with_context(context: RenderContext, handoff: Arc<catalog::Handoff>) -> Self {
        let api = FakeApi::new();
        let clock = ManualClock::new(TimestampMs(0));
        let products: Arc<dyn EntryStore<Product>> = Arc::new(MokaEntryStore::unbounded("products"));
        let categories: Arc<dyn EntryStore<Category>> =
            Arc::new(MokaEntryStore::unbounded("categories"));

        let cache = CatalogCache::builder(api.clone(), products.clone(), categories.clone())
            .context(context)
            .handoff(handoff)
            .clock(Arc::new(clock.clone()))
            .refresh_interval(Duration::from_millis(INTERVAL_MS))
            .build();

        Self {
            api,
            clock,
            products,
            categories,
            cache,
        }
    }

    pub async fn cached_products(&self, brand_id: &str) -> Vec<Product> {
        self.products
            .get(brand_id)
            .await
            .map(|entry| entry.data.to_vec())
            .unwrap_or_default()
    }
}

pub fn product(id: &str, slug: &str, price: f64) -> Product {
    let mut product = Product::new(id, slug, format!("Producto {id}"));
    product.price = price;
    product
}

pub fn category(id: &str) -> Category {
    Category::new(id, format!("Categoria {id}"))
}

/// Wait for the first event matching `pred`, failing after a second.
pub async fn next_event<F>(rx: &mut broadcast::Receiver<CatalogEvent>, pred: F) -> CatalogEvent
where
    F: Fn(&CatalogEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for catalog event")
}

pub fn is_background_products(event: &CatalogEvent) -> bool {
    matches!(event, CatalogEvent::ProductsUpdated(e) if e.source == UpdateSource::Background)
}

/// Poll until `cond` holds, failing after a second.
pub async fn wait_until<F>(cond: F)
where
    F: Fn() -> bool,
{
    tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
