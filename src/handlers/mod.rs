// src/handlers/mod.rs

pub mod lostfound;

use axum::response::IntoResponse;

use crate::models::envelope::ApiResponse;

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    ApiResponse::message("ok")
}
