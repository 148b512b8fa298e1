use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::{Router, routing::get};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` when the models are loaded, `models_not_loaded` otherwise
    pub status: String,
    pub models_available: bool,
    pub version: String,
}

/// Triggers the lazy model load on a cold instance, so the answer reflects
/// whether predictions can be served.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service status and model availability", body = HealthResponse)
    )
)]
#[tracing::instrument(name = "GET /api/health", skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let models_available = state.store.is_available().await;
    let status = if models_available {
        "healthy"
    } else {
        "models_not_loaded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        models_available,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
