//! vitals gateway binary.
//!
//! - Config: `VITALS_CONFIG` (default `vitals.yaml`), strict YAML
//! - Logging: `RUST_LOG` via `EnvFilter`
//! - Serves `/api/*` and `/actuator/*` until the process is stopped

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use vitals_core::error::{Result, VitalsError};
use vitals_gateway::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "vitals.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("VITALS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.server.listen.parse().map_err(|e| {
        VitalsError::BadRequest(format!("server.listen must be a valid SocketAddr: {e}"))
    })?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "vitals-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| VitalsError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| VitalsError::Internal(format!("server failed: {e}")))
}
