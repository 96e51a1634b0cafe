use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// The service's entire HTTP surface: a liveness probe and the metrics
/// scrape endpoint. No authentication — scrapes are not authenticated per
/// the specification this service implements.
pub fn create_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}
