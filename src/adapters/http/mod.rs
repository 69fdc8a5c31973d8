pub mod error;
pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use tower_http::trace::TraceLayer;
use crate::adapters::http::state::HttpState;

/// Margen para cabeceras y separadores multipart sobre el tamaño de la imagen.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: HttpState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(routes::index))
        .route("/predict", post(routes::predict))
        .route("/predict-img", post(routes::predict_img))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
