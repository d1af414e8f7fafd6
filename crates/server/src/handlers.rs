//! HTTP handlers for the watcher API.
//!
//! Every handler returns `(StatusCode, Json<Value>)`. Registry failures are mapped
//! by [`registry_error_response`]; scheduler failures by [`scheduler_error_response`].

#![allow(clippy::missing_errors_doc)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use watcher_core::{registry::RegistryError, scheduler::SchedulerError, types::Network};

use crate::router::AppState;

type ApiResponse = (StatusCode, Json<Value>);

#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    #[serde(default)]
    pub refresh: bool,
}

/// The 504 returned when a request passes its deadline.
#[must_use]
pub fn timeout_response() -> ApiResponse {
    (StatusCode::GATEWAY_TIMEOUT, Json(json!({ "error": "request timeout" })))
}

/// Maps a registry failure onto an HTTP status and error body.
///
/// Deadline overruns become 504, unresolvable names 404, ambiguity 409 and every
/// other upstream failure 502.
#[must_use]
pub fn registry_error_response(err: &RegistryError) -> ApiResponse {
    match err {
        RegistryError::Timeout => timeout_response(),
        e if e.is_not_found() => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": e.to_string(), "kind": e.kind() })),
        ),
        RegistryError::Ambiguous(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": err.to_string(), "kind": err.kind() })),
        ),
        e => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": e.to_string(), "kind": e.kind() })),
        ),
    }
}

#[must_use]
pub fn scheduler_error_response(err: &SchedulerError) -> ApiResponse {
    let status = match err {
        SchedulerError::UnknownJob(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

/// GET /api/v1/health
pub async fn health(State(state): State<AppState>) -> ApiResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": state.started_at.elapsed().as_secs(),
            "scheduler_running": state.scheduler.is_running(),
            "cache": state.engine.store().stats(),
        })),
    )
}

async fn upgrades_for(state: &AppState, network: Option<Network>) -> ApiResponse {
    match state.engine.collect_upgrades(network).await {
        Ok(report) => {
            let failed: Vec<Value> = report
                .failed
                .iter()
                .map(|(chain, error)| json!({ "chain": chain, "error": error }))
                .collect();
            (
                StatusCode::OK,
                Json(json!({
                    "count": report.upgrades.len(),
                    "upgrades": report.upgrades,
                    "failed": failed,
                })),
            )
        }
        Err(e) => {
            warn!(error = %e, network = ?network, "upgrade aggregation failed");
            registry_error_response(&e)
        }
    }
}

/// GET /api/v1/upgrades
pub async fn list_upgrades(State(state): State<AppState>) -> ApiResponse {
    upgrades_for(&state, None).await
}

/// GET /api/v1/upgrades/mainnet
pub async fn list_mainnet_upgrades(State(state): State<AppState>) -> ApiResponse {
    upgrades_for(&state, Some(Network::Mainnet)).await
}

/// GET /api/v1/upgrades/testnet
pub async fn list_testnet_upgrades(State(state): State<AppState>) -> ApiResponse {
    upgrades_for(&state, Some(Network::Testnet)).await
}

/// GET /api/v1/chains
pub async fn list_chains(State(state): State<AppState>) -> ApiResponse {
    let chains = state.engine.monitored_chains();
    (StatusCode::OK, Json(json!({ "count": chains.len(), "chains": chains })))
}

/// GET /api/v1/chains/{name}
pub async fn get_chain(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<RefreshParams>,
) -> ApiResponse {
    match state.engine.get_chain_info(&name, params.refresh).await {
        Ok(descriptor) => (StatusCode::OK, Json(json!(descriptor))),
        Err(e) => {
            debug!(chain = %name, error = %e, "chain lookup failed");
            registry_error_response(&e)
        }
    }
}

/// GET /api/v1/chains/{name}/upgrade
///
/// Responds with the record, or `null` when the chain has no upgrade.
pub async fn get_chain_upgrade(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<RefreshParams>,
) -> ApiResponse {
    match state.engine.get_upgrade_info(&name, params.refresh).await {
        Ok(record) => (StatusCode::OK, Json(json!(record))),
        Err(e) => {
            debug!(chain = %name, error = %e, "upgrade lookup failed");
            registry_error_response(&e)
        }
    }
}

/// GET /api/v1/jobs
pub async fn list_jobs(State(state): State<AppState>) -> ApiResponse {
    let jobs = state.scheduler.list_jobs();
    (
        StatusCode::OK,
        Json(json!({ "running": state.scheduler.is_running(), "jobs": jobs })),
    )
}

/// GET /api/v1/jobs/{name}
pub async fn get_job(State(state): State<AppState>, Path(name): Path<String>) -> ApiResponse {
    match state.scheduler.job_status(&name) {
        Some(status) => (StatusCode::OK, Json(json!(status))),
        None => scheduler_error_response(&SchedulerError::UnknownJob(name)),
    }
}

/// POST /api/v1/jobs/{name}/run
pub async fn run_job(State(state): State<AppState>, Path(name): Path<String>) -> ApiResponse {
    match state.scheduler.run_now(&name).await {
        Ok(status) => (StatusCode::OK, Json(json!(status))),
        Err(e) => scheduler_error_response(&e),
    }
}

/// POST /api/v1/scheduler/start
pub async fn start_scheduler(State(state): State<AppState>) -> ApiResponse {
    match state.scheduler.start().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "running": true }))),
        Err(e) => scheduler_error_response(&e),
    }
}

/// POST /api/v1/scheduler/stop
pub async fn stop_scheduler(State(state): State<AppState>) -> ApiResponse {
    state.scheduler.stop().await;
    (StatusCode::OK, Json(json!({ "running": false })))
}
