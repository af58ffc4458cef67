//! Operational HTTP endpoints.
//!
//! - `/actuator/health`     : aggregate probe health (503 when DOWN)
//! - `/actuator/metrics`    : JSON snapshot of every series
//! - `/actuator/prometheus` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::app_state::AppState;

pub async fn health(State(state): State<AppState>) -> Response {
    let health = state.health().aggregate().await;
    let code = if health.is_up() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(health)).into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    Json(state.metrics().snapshot()).into_response()
}

pub async fn prometheus(State(state): State<AppState>) -> Response {
    let body = state.metrics().render_prometheus();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
