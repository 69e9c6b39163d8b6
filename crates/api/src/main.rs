use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use avstudio_backends::{BackendConfig, HttpBackend};
use avstudio_events::JobStore;
use avstudio_pipeline::{Orchestrator, PipelineSession};
use avstudio_worker::{ExecutorConfig, PipelineExecutor};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use avstudio_api::config::ServerConfig;
use avstudio_api::router::build_app_router;
use avstudio_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "avstudio_api=debug,avstudio_worker=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    let executor_config = ExecutorConfig::from_env()?;
    let backend_config = BackendConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    tracing::info!(
        text_generation = backend_config.azure.is_some(),
        media_generation = backend_config.generation_url.is_some(),
        demo_mode = executor_config.demo_mode,
        "Loaded backend configuration",
    );

    // --- Jobs ---
    let backend = HttpBackend::new(&backend_config).context("Failed to build HTTP client")?;
    let executor = PipelineExecutor::new(Arc::new(backend), executor_config);
    let jobs = JobStore::new(Arc::new(executor));

    // --- Pipeline ---
    let shutdown = CancellationToken::new();
    let (orchestrator, orchestrator_handle) = Orchestrator::spawn(shutdown.child_token());
    let session = Arc::new(PipelineSession::new(
        jobs.clone(),
        orchestrator,
        shutdown.child_token(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        jobs,
        session,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    // Cancelling on the signal stops the orchestrator, which ends open
    // pipeline streams so the server can drain.
    let stop = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            stop.cancel();
        })
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    shutdown.cancel();
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain, orchestrator_handle).await.is_err() {
        tracing::warn!("Pipeline orchestrator did not stop in time");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
