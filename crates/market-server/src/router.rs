use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all catalog endpoints.
///
/// Stored pictures under `blob_root` are served at `/pictures/items`.
pub fn build_router(state: AppState, blob_root: &Path, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .route("/items", get(handler::list_items).post(handler::create_item))
        .route("/items/item", get(handler::get_item))
        .route("/items/mine", get(handler::my_items))
        .route("/items/search", get(handler::search_items))
        .route("/items/raw/:id", get(handler::get_raw_item))
        .route("/items/repair/:id", post(handler::repair_item))
        .route("/items/verify/:id", get(handler::verify_item))
        .nest_service("/pictures/items", ServeDir::new(blob_root))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
