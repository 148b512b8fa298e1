use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use error::NotFoundBody;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

mod routes;

pub mod error;
pub mod openapi;
pub mod state;

pub use axum;
pub use diagnosis_model as model;
pub use state::{AppState, State};

/// All `/api/*` routes, shared by every host. Unknown API paths get a JSON 404;
/// anything outside `/api` is left to the caller's own fallback.
pub fn construct_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(routes::health::routes())
        .merge(routes::features::routes())
        .merge(routes::predict::routes())
        .route("/openapi.json", get(openapi_json))
        .fallback(not_found)
        .with_state(state);

    Router::new().nest("/api", router).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(CompressionLayer::new()),
    )
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundBody {
            error: "Not Found".to_string(),
            message: "The requested resource was not found".to_string(),
        }),
    )
}
