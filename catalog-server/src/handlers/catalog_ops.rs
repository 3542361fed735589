use crate::api::ProductsQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use catalog::{CatalogOperations, Category, ForcedRefresh, Product, SlugLookup};
use tracing::info;

/// GET /api/brands/{brand}/products
pub async fn get_products(
    State(state): State<AppState>,
    Path(brand): Path<String>,
    Query(query): Query<ProductsQuery>,
) -> Json<Vec<Product>> {
    info!("GET products: brand={}", brand);

    let products = state.cache.fetch_products(&brand).await;
    Json(query.to_filter().apply(&products))
}

/// GET /api/brands/{brand}/categories
pub async fn get_categories(
    State(state): State<AppState>,
    Path(brand): Path<String>,
) -> Json<Vec<Category>> {
    info!("GET categories: brand={}", brand);
    Json(state.cache.fetch_categories(&brand).await)
}

/// GET /api/products/{slug}
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> (StatusCode, Json<SlugLookup>) {
    info!("GET product: slug={}", slug);

    let lookup = state.cache.fetch_product_by_slug(&slug).await;
    let status = if lookup.correct {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    (status, Json(lookup))
}

/// POST /api/brands/{brand}/refresh
pub async fn force_refresh(
    State(state): State<AppState>,
    Path(brand): Path<String>,
) -> Json<ForcedRefresh> {
    info!("REFRESH: brand={}", brand);
    Json(state.cache.force_refresh(&brand).await)
}
