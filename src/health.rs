//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload with the server version,
//! uptime, the tracked form, whether the record API is fully configured,
//! and cumulative invocation outcomes.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::validation::resolve_target;
use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub forwarding: ForwardingHealth,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct ForwardingHealth {
    pub form: String,
    pub table: String,
    pub configured: bool,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub submissions_inserted: u64,
    pub submissions_ignored: u64,
    pub submissions_failed: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.forwarder.config();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        forwarding: ForwardingHealth {
            form: config.form_name.clone(),
            table: config.table_name.clone(),
            configured: resolve_target(config).is_ok(),
        },
        stats: StatsResponse {
            submissions_inserted: state.stats.inserted.load(Ordering::Relaxed),
            submissions_ignored: state.stats.ignored.load(Ordering::Relaxed),
            submissions_failed: state.stats.failed.load(Ordering::Relaxed),
        },
    })
}
