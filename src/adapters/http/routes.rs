use axum::{extract::State, response::IntoResponse, Json};

use crate::adapters::http::state::HttpState;
use crate::application::dto::{HealthResponse, ModelOption, ModelsResponse};

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

pub async fn list_models(State(st): State<HttpState>) -> impl IntoResponse {
    let models = st
        .detection
        .list_models()
        .into_iter()
        .map(ModelOption::from)
        .collect();
    Json(ModelsResponse { models })
}
