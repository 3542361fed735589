use crate::api::{VisibilityRequest, VisibilityResponse};
use crate::state::AppState;
use axum::{extract::State, Json};
use tracing::info;

/// PUT /visibility
pub async fn set_visibility(
    State(state): State<AppState>,
    Json(req): Json<VisibilityRequest>,
) -> Json<VisibilityResponse> {
    info!("VISIBILITY: visible={}", req.visible);

    state.visibility.set(req.visible);
    Json(VisibilityResponse {
        visible: state.visibility.is_visible(),
    })
}
