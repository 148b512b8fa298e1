#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use axum::{Router, routing::get};
use diagnosis_api::{construct_router, state::State};
use std::sync::Arc;

mod config;
mod metrics;
mod static_files;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    metrics::init_telemetry();

    tracing::info!("Starting Disease Prediction API Service");

    let config = config::Config::from_env()?;
    tracing::info!(
        model_dir = %config.model_dir.display(),
        static_dir = %config.static_dir.display(),
        "Loaded configuration"
    );

    let state = Arc::new(State::from_model_dir(config.model_dir.clone()));
    if state.preload().await {
        tracing::info!("Models ready");
    }

    let app = Router::new()
        .merge(construct_router(state))
        .route("/metrics", get(metrics::handler))
        .fallback_service(static_files::router(&config.static_dir))
        .layer(axum::middleware::from_fn(metrics::track));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
