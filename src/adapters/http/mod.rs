pub mod error;
pub mod routes;
pub mod state;

use std::path::Path;

use axum::{routing::{get, post}, Router};
use tower_http::services::ServeDir;

use crate::adapters::http::state::HttpState;

/// Rutas de la API más `GET /image/{filename}`, que sirve el área temporal `scratch_dir`.
pub fn router(state: HttpState, scratch_dir: &Path) -> Router {
    Router::new()
        .route("/detect", post(routes::detect))
        .route("/articles", post(routes::create_article).get(routes::list_articles))
        .route("/articles/:id", get(routes::get_article))
        .nest_service("/image", ServeDir::new(scratch_dir))
        .with_state(state)
}
