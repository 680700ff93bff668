// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{self, lostfound},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Public reads: listing and item detail.
/// * Authenticated writes and "my items" (bearer token, see `utils::jwt`).
/// * Admin-only stats.
/// * Global middleware: Trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/openapi.json", get(lostfound::openapi))
        .route(
            "/api/lostfound",
            get(lostfound::list_items).post(lostfound::create_item),
        )
        .route("/api/lostfound/user/my-items", get(lostfound::my_items))
        .route("/api/lostfound/admin/stats", get(lostfound::stats))
        .route(
            "/api/lostfound/{id}",
            get(lostfound::get_item)
                .put(lostfound::update_item)
                .delete(lostfound::delete_item),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
