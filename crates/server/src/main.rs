use anyhow::Result;
use axum::serve;
use server::{create_app, AppState};
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use watcher_core::{config::AppConfig, runtime::WatcherRuntime};

const DEFAULT_FILTER: &str = "warn,watcher_core=info,server=info,cli=info";

/// Initializes the logging system based on the configuration.
///
/// `RUST_LOG=debug` and `RUST_LOG=trace` raise the workspace crates only; any other
/// value is used as a full filter directive.
fn init_logging(config: &AppConfig) {
    let filter = match std::env::var("RUST_LOG").as_deref() {
        Ok("debug") => EnvFilter::new("warn,watcher_core=debug,server=debug,cli=debug"),
        Ok("trace") => EnvFilter::new("warn,watcher_core=trace,server=trace,cli=trace"),
        Ok(_) => EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        Err(_) => EnvFilter::new(DEFAULT_FILTER),
    };

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;
    config.validate().map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

    init_logging(&config);
    info!("starting upgrade watcher");
    debug!(
        environment = %config.environment,
        registry = %config.registry.base_url,
        chains_file = %config.chains_file,
        bind_port = config.server.bind_port,
        "configuration loaded"
    );

    let addr = config.socket_addr().map_err(|e| anyhow::anyhow!(e))?;
    let request_timeout = config.request_timeout();

    let runtime = WatcherRuntime::builder()
        .with_config(config)
        .build()
        .map_err(|e| anyhow::anyhow!("Runtime initialization failed: {e}"))?;
    runtime.start().await.map_err(|e| anyhow::anyhow!("Runtime start failed: {e}"))?;

    let app = create_app(AppState::from_runtime(&runtime), request_timeout);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "http server listening");

    if let Err(e) = serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!(error = %e, "server error occurred");
    }

    runtime.shutdown().await;
    info!("server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install ctrl+c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, starting graceful shutdown");
}
