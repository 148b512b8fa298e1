//! Landing page and asset serving for the browser front end.

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::Path;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

type SiteService = ServeDir<ServeFile>;

pub const INDEX_FILE: &str = "index.html";

/// Routes every request to an existing file under `dir`, or to `index.html`
/// when the path does not resolve. Only a missing landing page yields the
/// JSON 404.
pub fn router(dir: &Path) -> Router {
    let site = ServeDir::new(dir).fallback(ServeFile::new(dir.join(INDEX_FILE)));
    Router::new().fallback(serve).with_state(site)
}

async fn serve(State(site): State<SiteService>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    match site.oneshot(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => {
            tracing::debug!(%path, "No static asset or landing page");
            diagnosis_api::not_found().await.into_response()
        }
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
