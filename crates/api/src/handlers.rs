use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tlsprobe_infrastructure::metrics::PrometheusMetricsSink;
use tracing::{error, info, instrument};

use crate::state::AppState;

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[instrument(skip_all)]
pub async fn health_check(State(state): State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Runs a full scrape (`Registry::collect`) and renders the result as
/// OpenMetrics text. Every call re-handshakes every live TLS checker, so
/// this is the expensive endpoint — Prometheus is expected to call it on
/// its own scrape cadence, not more often.
#[instrument(skip_all, name = "api_metrics_scrape")]
pub async fn metrics(State(state): State<AppState>) -> Response {
    let sink = Arc::new(PrometheusMetricsSink::new());
    state.registry.collect(sink.clone()).await;

    match sink.render() {
        Ok(body) => {
            info!("metrics scrape completed");
            (StatusCode::OK, [(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], body).into_response()
        }
        Err(err) => {
            error!(%err, "failed to render metrics registry");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
