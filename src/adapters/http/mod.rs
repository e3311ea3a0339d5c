pub mod routes;
pub mod state;
pub mod ws;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use crate::adapters::http::state::HttpState;
use crate::adapters::http::ws::ws_handler;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/models", get(routes::list_models))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
