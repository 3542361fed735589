use crate::api::RenderResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use catalog::CatalogOperations;
use tracing::{error, info};

/// GET /render/{brand}
///
/// Runs both list reads through a fresh server-context cache and returns the lists together
/// with the handoff blob the render produced.
pub async fn render_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
) -> Result<Json<RenderResponse>, StatusCode> {
    info!("RENDER: brand={}", brand);

    let cache = state.render_cache();
    let (products, categories) =
        tokio::join!(cache.fetch_products(&brand), cache.fetch_categories(&brand));

    let handoff = cache.handoff().to_blob().map_err(|e| {
        error!("Failed to serialise handoff for brand '{}': {}", brand, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(RenderResponse {
        products,
        categories,
        handoff,
    }))
}
