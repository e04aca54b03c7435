use crate::state::AppState;
use crate::{api, logging};
use axum::routing::get;
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};

pub fn build_http_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(api::dashboard))
        .route("/health", get(api::health))
        .route("/api/disks", get(api::list_disks))
        .route("/api/trend", get(api::trend))
        .route("/api/history", get(api::history))
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logging))
}
