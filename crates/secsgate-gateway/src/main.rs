//! secsgate gateway
//!
//! - `GET /api/templates`, `GET /api/templates/:name`, `POST /api/send`
//! - Ops: `/healthz`, `/readyz`, `/metrics`
//! - Config from `$SECSGATE_CONFIG` (default `secsgate.yaml`)

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use secsgate_core::error::{Result, SecsGateError};
use secsgate_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "secsgate-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var("SECSGATE_CONFIG").unwrap_or_else(|_| "secsgate.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| SecsGateError::BadRequest(format!("gateway.listen: {e}")))?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "secsgate-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| SecsGateError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| SecsGateError::Internal(format!("server failed: {e}")))
}
