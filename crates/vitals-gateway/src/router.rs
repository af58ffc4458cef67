//! Axum router wiring.
//!
//! Business API under `/api`, operational endpoints under `/actuator`.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{api, app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/hello", get(api::hello))
        .route("/api/operation", post(api::operation))
        .route("/api/error", get(api::simulate_error))
        .route("/api/users/active", post(api::update_active_users))
        .route("/api/info", get(api::info))
        .route("/actuator/health", get(ops::health))
        .route("/actuator/metrics", get(ops::metrics))
        .route("/actuator/prometheus", get(ops::prometheus))
        .with_state(state)
}
