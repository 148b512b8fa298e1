use crate::error::{ApiError, ErrorBody};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::{Router, routing::post};
use bytes::Bytes;
use diagnosis_model::{PredictionError, PredictionResponse};
use serde_json::Value;

pub fn routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

/// Predict a disease from the 46 patient features.
///
/// The body is a flat JSON object keyed by the names from `/api/features`.
/// Numbers and booleans are accepted; unknown keys are ignored.
#[utoipa::path(
    post,
    path = "/api/predict",
    tag = "prediction",
    request_body(content = Object, content_type = "application/json"),
    responses(
        (status = 200, description = "Predicted disease with class probabilities", body = PredictionResponse),
        (status = 400, description = "Missing or invalid feature", body = ErrorBody),
        (status = 500, description = "Models are not available", body = ErrorBody)
    )
)]
#[tracing::instrument(name = "POST /api/predict", skip(state, body))]
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let outcome = run(&state, &body).await;

    let label = match &outcome {
        Ok(_) => "success",
        Err(err) if err.is_client_error() => "rejected",
        Err(_) => "unavailable",
    };
    metrics::counter!("predictions_total", "outcome" => label).increment(1);

    Ok(Json(outcome?))
}

async fn run(state: &AppState, body: &[u8]) -> Result<PredictionResponse, PredictionError> {
    // The store is consulted before the body, matching the order in which
    // failures are reported.
    state.store.ensure_loaded().await?;

    let payload: Value = serde_json::from_slice(body).map_err(|err| {
        tracing::warn!(error = %err, "Unreadable prediction body");
        PredictionError::InvalidRequest
    })?;
    state.predictor.predict(&payload).await
}
