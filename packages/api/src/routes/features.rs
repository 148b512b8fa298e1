use crate::state::AppState;
use axum::Json;
use axum::{Router, routing::get};
use diagnosis_model::FEATURE_NAMES;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub fn routes() -> Router<AppState> {
    Router::new().route("/features", get(features))
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct FeaturesResponse {
    /// Required request keys, in model column order
    pub features: Vec<String>,
    pub count: usize,
    /// Same value as `count`
    pub total_features: usize,
}

#[utoipa::path(
    get,
    path = "/api/features",
    tag = "prediction",
    responses(
        (status = 200, description = "The ordered list of required features", body = FeaturesResponse)
    )
)]
#[tracing::instrument(name = "GET /api/features")]
pub async fn features() -> Json<FeaturesResponse> {
    Json(FeaturesResponse {
        features: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
        count: FEATURE_NAMES.len(),
        total_features: FEATURE_NAMES.len(),
    })
}
