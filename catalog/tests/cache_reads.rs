mod common;

use catalog::domain::response::{FOUND_IN_CACHE, LOOKUP_FAILED};
use catalog::events::{CatalogEvent, UpdateSource};
use catalog::CatalogOperations;
use common::*;
use shared::TimestampMs;
use std::time::Duration;

#[tokio::test]
async fn test_concurrent_first_reads_issue_one_request() {
    let h = Harness::client();
    h.api.set_products("B1", vec![product("p1", "bomba-x", 10.0)]);
    h.api.set_delay(Duration::from_millis(20));

    let (first, second) = tokio::join!(h.cache.fetch_products("B1"), h.cache.fetch_products("B1"));
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(h.api.product_calls(), 1);

    h.cache.fetch_products("B1").await;
    assert_eq!(h.api.product_calls(), 1);
}

#[tokio::test]
async fn test_failed_seed_returns_empty_and_caches_nothing() {
    let h = Harness::client();
    h.api.set_categories("B1", vec![category("c1")]);
    h.api.fail_categories(true);

    assert!(h.cache.fetch_categories("B1").await.is_empty());
    assert!(h.categories.get("B1").await.is_none());

    h.api.fail_categories(false);
    let categories = h.cache.fetch_categories("B1").await;
    assert_eq!(categories, vec![category("c1")]);
    assert_eq!(h.api.category_calls(), 2);
}

#[tokio::test]
async fn test_staleness_boundary() {
    let h = Harness::client();
    let mut events = h.cache.subscribe();
    h.clock.set(TimestampMs(1000));
    h.api.set_products("B1", vec![product("p1", "bomba-x", 10.0)]);
    h.cache.fetch_products("B1").await;
    assert_eq!(h.api.product_calls(), 1);

    h.clock.set(TimestampMs(1000 + INTERVAL_MS - 1));
    h.cache.fetch_products("B1").await;
    tokio::task::yield_now().await;
    assert_eq!(h.api.product_calls(), 1);

    h.api.set_products("B1", vec![product("p1", "bomba-x", 12.0)]);
    h.clock.set(TimestampMs(1000 + INTERVAL_MS + 1));
    let served = h.cache.fetch_products("B1").await;
    assert_eq!(served[0].price, 10.0);

    next_event(&mut events, is_background_products).await;
    assert_eq!(h.api.product_calls(), 2);
    assert_eq!(h.cached_products("B1").await[0].price, 12.0);

    let entry = h.products.get("B1").await.unwrap();
    assert_eq!(entry.requested_at, TimestampMs(1000 + INTERVAL_MS + 1));
}

#[tokio::test]
async fn test_round_trip_scenario() {
    let h = Harness::client();
    let mut events = h.cache.subscribe();
    let seeded = vec![product("p1", "bomba-x", 10.0), product("p2", "filtro-y", 4.5)];
    h.api.set_products("B1", seeded.clone());

    assert_eq!(h.cache.fetch_products("B1").await, seeded);
    assert_eq!(h.api.product_calls(), 1);

    h.clock.set(TimestampMs(1000));
    assert_eq!(h.cache.fetch_products("B1").await, seeded);
    assert_eq!(h.api.product_calls(), 1);

    h.clock.set(TimestampMs(6000));
    assert_eq!(h.cache.fetch_products("B1").await, seeded);
    next_event(&mut events, is_background_products).await;
    assert_eq!(h.api.product_calls(), 2);
}

#[tokio::test]
async fn test_stale_reads_share_one_background_refresh() {
    let h = Harness::client();
    let mut events = h.cache.subscribe();
    h.api.set_products("B1", vec![product("p1", "bomba-x", 10.0)]);
    h.cache.fetch_products("B1").await;

    h.clock.set(TimestampMs(INTERVAL_MS + 1));
    let gate = h.api.hold_next_products_call();
    h.cache.fetch_products("B1").await;
    wait_until(|| h.api.product_calls() == 2).await;

    h.cache.fetch_products("B1").await;
    h.cache.fetch_products("B1").await;
    assert_eq!(h.api.product_calls(), 2);

    gate.notify_one();
    next_event(&mut events, is_background_products).await;
    assert_eq!(h.api.product_calls(), 2);
}

#[tokio::test]
async fn test_background_failure_keeps_stale_data() {
    let h = Harness::client();
    let mut events = h.cache.subscribe();
    h.api.set_categories("B1", vec![category("c1")]);
    h.cache.fetch_categories("B1").await;

    h.api.fail_categories(true);
    h.clock.set(TimestampMs(INTERVAL_MS + 1));
    assert_eq!(h.cache.fetch_categories("B1").await, vec![category("c1")]);

    let event = next_event(&mut events, |e| matches!(e, CatalogEvent::RefreshFailed(_))).await;
    assert_eq!(event.key(), "B1");
    assert_eq!(h.cache.fetch_categories("B1").await, vec![category("c1")]);
}

#[tokio::test]
async fn test_older_background_result_is_discarded() {
    let h = Harness::client();
    let mut events = h.cache.subscribe();
    h.api.set_products("B1", vec![product("p1", "bomba-x", 1.0)]);
    h.cache.fetch_products("B1").await;

    // Background refresh issued at t=6000 captures the v2 list and stalls.
    h.clock.set(TimestampMs(6000));
    h.api.set_products("B1", vec![product("p1", "bomba-x", 2.0)]);
    let gate = h.api.hold_next_products_call();
    h.cache.fetch_products("B1").await;
    wait_until(|| h.api.product_calls() == 2).await;

    // A forced refresh issued later lands first.
    h.clock.set(TimestampMs(7000));
    h.api.set_products("B1", vec![product("p1", "bomba-x", 3.0)]);
    let forced = h.cache.force_refresh("B1").await;
    assert_eq!(forced.products[0].price, 3.0);

    gate.notify_one();
    let late = tokio::time::timeout(Duration::from_millis(200), async {
        loop {
            match events.recv().await {
                Ok(event) if is_background_products(&event) => return event,
                Ok(_) => continue,
                Err(_) => std::future::pending::<()>().await,
            }
        }
    })
    .await;
    assert!(late.is_err(), "stale background result must not be written");

    let entry = h.products.get("B1").await.unwrap();
    assert_eq!(entry.data[0].price, 3.0);
    assert_eq!(entry.requested_at, TimestampMs(7000));
}

#[tokio::test]
async fn test_slug_patch_survives_older_list_refresh() {
    let h = Harness::client();
    let mut events = h.cache.subscribe();
    h.api.set_products("B1", vec![product("p1", "bomba-x", 1.0)]);
    h.cache.fetch_products("B1").await;

    // Background list refresh issued at t=6000 captures price 2 and stalls.
    h.clock.set(TimestampMs(6000));
    h.api.set_products("B1", vec![product("p1", "bomba-x", 2.0)]);
    let gate = h.api.hold_next_products_call();
    h.cache.fetch_products("B1").await;
    wait_until(|| h.api.product_calls() == 2).await;

    // Slug lookup issued at t=7000 patches price 3 in.
    h.clock.set(TimestampMs(7000));
    h.api.set_slug(product("p1", "bomba-x", 3.0));
    h.cache.fetch_product_by_slug("bomba-x").await;
    next_event(&mut events, |e| matches!(e, CatalogEvent::ProductPatched(_))).await;
    assert_eq!(h.cached_products("B1").await[0].price, 3.0);

    gate.notify_one();
    let late = tokio::time::timeout(Duration::from_millis(200), async {
        loop {
            match events.recv().await {
                Ok(event) if is_background_products(&event) => return event,
                Ok(_) => continue,
                Err(_) => std::future::pending::<()>().await,
            }
        }
    })
    .await;
    assert!(late.is_err(), "list issued before the patch must not be written");

    let entry = h.products.get("B1").await.unwrap();
    assert_eq!(entry.data[0].price, 3.0);
    assert_eq!(entry.requested_at, TimestampMs(7000));
}

#[tokio::test]
async fn test_slug_hit_in_cached_list_skips_network() {
    let h = Harness::client();
    h.api.set_products("B1", vec![product("p1", "bomba-x", 10.0)]);
    h.cache.fetch_products("B1").await;

    let lookup = h.cache.fetch_product_by_slug("bomba-x").await;
    assert!(lookup.correct);
    assert_eq!(lookup.message, FOUND_IN_CACHE);
    assert_eq!(lookup.product.unwrap().id, "p1");
    assert_eq!(h.api.slug_calls(), 0);
}

#[tokio::test]
async fn test_slug_miss_issues_one_request() {
    let h = Harness::client();
    h.api.set_slug(product("p9", "valvula-z", 33.0));

    let lookup = h.cache.fetch_product_by_slug("valvula-z").await;
    assert!(lookup.correct);
    assert_eq!(lookup.product.unwrap().id, "p9");
    assert_eq!(h.api.slug_calls(), 1);

    let missing = h.cache.fetch_product_by_slug("inexistente").await;
    assert!(!missing.correct);
    assert_eq!(missing.message, "Producto no encontrado");
    assert_eq!(h.api.slug_calls(), 2);
}

#[tokio::test]
async fn test_slug_transport_failure_reports_message() {
    let h = Harness::client();
    h.api.fail_slugs(true);

    let lookup = h.cache.fetch_product_by_slug("bomba-x").await;
    assert!(!lookup.correct);
    assert_eq!(lookup.message, LOOKUP_FAILED);
    assert!(lookup.product.is_none());
}

#[tokio::test]
async fn test_stale_slug_hit_patches_only_matching_record() {
    let h = Harness::client();
    let mut events = h.cache.subscribe();
    h.api.set_products(
        "B1",
        vec![product("p1", "bomba-x", 10.0), product("p2", "filtro-y", 4.5)],
    );
    h.api.set_products(
        "B2",
        vec![product("p3", "manguera", 7.0), product("p1", "bomba-x", 10.0)],
    );
    h.api.set_products("B3", vec![product("p4", "sensor", 99.0)]);
    for brand in ["B1", "B2", "B3"] {
        h.cache.fetch_products(brand).await;
    }

    h.clock.set(TimestampMs(INTERVAL_MS + 1));
    h.api.set_slug(product("p1", "bomba-x", 15.0));

    let served = h.cache.fetch_product_by_slug("bomba-x").await;
    assert_eq!(served.product.unwrap().price, 10.0);

    let event = next_event(&mut events, |e| matches!(e, CatalogEvent::ProductPatched(_))).await;
    let CatalogEvent::ProductPatched(patched) = event else {
        unreachable!()
    };
    let mut brands = patched.brand_ids.clone();
    brands.sort();
    assert_eq!(brands, vec!["B1".to_string(), "B2".to_string()]);

    let b1 = h.cached_products("B1").await;
    assert_eq!(b1[0].price, 15.0);
    assert_eq!(b1[1], product("p2", "filtro-y", 4.5));

    let b2 = h.cached_products("B2").await;
    assert_eq!(b2[0], product("p3", "manguera", 7.0));
    assert_eq!(b2[1].price, 15.0);

    assert_eq!(h.cached_products("B3").await, vec![product("p4", "sensor", 99.0)]);
    assert_eq!(h.api.slug_calls(), 1);
}

#[tokio::test]
async fn test_seed_publishes_update_event() {
    let h = Harness::client();
    let mut events = h.cache.subscribe();
    h.api.set_categories("B1", vec![category("c1"), category("c2")]);

    h.cache.fetch_categories("B1").await;
    let event = next_event(&mut events, |e| matches!(e, CatalogEvent::CategoriesUpdated(_))).await;
    let CatalogEvent::CategoriesUpdated(updated) = event else {
        unreachable!()
    };
    assert_eq!(updated.count, 2);
    assert_eq!(updated.source, UpdateSource::Seed);
}
