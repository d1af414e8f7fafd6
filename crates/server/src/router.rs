//! Route table and shared handler state.

use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use watcher_core::{engine::ChainEngine, runtime::WatcherRuntime, scheduler::Scheduler};

use crate::handlers;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ChainEngine>,
    pub scheduler: Arc<Scheduler>,
    pub started_at: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(engine: Arc<ChainEngine>, scheduler: Arc<Scheduler>) -> Self {
        Self { engine, scheduler, started_at: Instant::now() }
    }

    #[must_use]
    pub fn from_runtime(runtime: &WatcherRuntime) -> Self {
        Self::new(runtime.engine().clone(), runtime.scheduler().clone())
    }
}

/// Builds the `/api/v1` router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/upgrades", get(handlers::list_upgrades))
        .route("/upgrades/mainnet", get(handlers::list_mainnet_upgrades))
        .route("/upgrades/testnet", get(handlers::list_testnet_upgrades))
        .route("/chains", get(handlers::list_chains))
        .route("/chains/{name}", get(handlers::get_chain))
        .route("/chains/{name}/upgrade", get(handlers::get_chain_upgrade))
        .route("/jobs", get(handlers::list_jobs))
        .route("/jobs/{name}", get(handlers::get_job))
        .route("/jobs/{name}/run", post(handlers::run_job))
        .route("/scheduler/start", post(handlers::start_scheduler))
        .route("/scheduler/stop", post(handlers::stop_scheduler))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Builds the served application: [`create_router`] behind the per-request timeout.
///
/// A request cut off by the timeout gets the same 504 body as an aggregate read
/// that passes its deadline.
pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    create_router(state)
        .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, request_timeout))
        .layer(middleware::map_response(fill_timeout_body))
}

// The timeout layer answers with an empty body and no content type.
async fn fill_timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::GATEWAY_TIMEOUT
        && !response.headers().contains_key(CONTENT_TYPE)
    {
        return handlers::timeout_response().into_response();
    }
    response
}
