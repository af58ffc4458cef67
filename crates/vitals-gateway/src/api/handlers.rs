use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};

use vitals_core::error::{ClientCode, Result, VitalsError};

use crate::app_state::AppState;
use crate::config::ApiSection;

use super::{error_response, into_response};

#[derive(Debug, Deserialize)]
pub struct OperationQuery {
    #[serde(rename = "type")]
    pub op_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveUsersQuery {
    pub count: i64,
}

pub async fn hello(State(state): State<AppState>) -> Json<Value> {
    let metrics = state.metrics();
    let _timer = metrics.time_endpoint("hello");
    metrics.increment_request_count();

    Json(json!({
        "message": "Hello from vitals!",
        "timestamp": Utc::now().timestamp_millis().to_string()
    }))
}

/// Timed business operation. The guard stops the timer on success and on
/// failure alike.
pub async fn operation(
    State(state): State<AppState>,
    Query(q): Query<OperationQuery>,
) -> Response {
    let metrics = state.metrics();
    let _timer = metrics.time();
    let _endpoint_timer = metrics.time_endpoint("operation");

    metrics.increment_request_count();
    metrics.increment_business_operation(&q.op_type);
    tracing::debug!(op_type = %q.op_type, "business operation started");

    match perform(&state.cfg().api).await {
        Ok(()) => Json(json!({
            "status": "success",
            "operationType": q.op_type,
            "message": "Operation completed successfully"
        }))
        .into_response(),
        Err(e) => {
            metrics.increment_error_count();
            tracing::warn!(op_type = %q.op_type, error = %e, "business operation failed");
            into_response(&e)
        }
    }
}

/// Decide the simulated delay and outcome up front; the RNG is not `Send`
/// and must not live across the sleep.
fn roll(api: &ApiSection) -> (Duration, bool) {
    let mut rng = rand::thread_rng();
    let delay_ms = rng.gen_range(api.operation_delay_min_ms..=api.operation_delay_max_ms);
    let fails = rng.gen_bool(api.operation_failure_rate);
    (Duration::from_millis(delay_ms), fails)
}

async fn perform(api: &ApiSection) -> Result<()> {
    let (delay, fails) = roll(api);
    tokio::time::sleep(delay).await;
    if fails {
        return Err(VitalsError::Internal("simulated operation failure".into()));
    }
    Ok(())
}

pub async fn simulate_error(State(state): State<AppState>) -> Response {
    let metrics = state.metrics();
    metrics.increment_request_count();
    metrics.increment_error_count();

    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ClientCode::Internal,
        "Simulated error for metrics testing",
    )
}

pub async fn update_active_users(
    State(state): State<AppState>,
    Query(q): Query<ActiveUsersQuery>,
) -> Json<Value> {
    state.metrics().set_active_users(q.count);

    Json(json!({
        "message": "Active user count updated",
        "count": q.count.to_string()
    }))
}

pub async fn info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "application": state.metrics().application(),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Application health and operational metrics demo",
        "endpoints": {
            "health": "/actuator/health",
            "metrics": "/actuator/metrics",
            "prometheus": "/actuator/prometheus",
            "info": "/api/info"
        }
    }))
}
