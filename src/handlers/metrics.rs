use crate::app_state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

/// GET /metrics
///
/// Ceremony counters in Prometheus text format. Empty when the no-op
/// metrics backend is configured.
pub async fn metrics_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    // ---
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        app_state.metrics().render(),
    )
}
