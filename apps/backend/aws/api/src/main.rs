#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use diagnosis_api::{State, construct_router, model::DEFAULT_MODEL_DIR};
use lambda_http::{Error, run, tracing};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

// Each cold start builds a fresh, unloaded store; the first request that
// needs the models loads them and the container keeps them while it is warm.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let sentry_endpoint = std::env::var("SENTRY_ENDPOINT").unwrap_or_default();

    let _sentry_guard = if sentry_endpoint.is_empty() {
        tracing::init_default_subscriber();
        None
    } else {
        let guard = sentry::init((
            sentry_endpoint,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                traces_sample_rate: 0.3,
                ..Default::default()
            },
        ));
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(sentry_tracing::layer())
            .init();
        Some(guard)
    };

    let model_dir = std::env::var("MODEL_DIR")
        .ok()
        .filter(|dir| !dir.is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL_DIR.to_string());

    let state = Arc::new(State::from_model_dir(model_dir));
    let app = construct_router(state);

    run(app).await
}
