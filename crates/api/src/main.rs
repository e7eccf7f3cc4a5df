use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use drapely_core::config::TryOnConfig;
use drapely_pipeline::{queue, TryOnPipeline, TryOnWorker};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drapely_api::config::ServerConfig;
use drapely_api::router::build_app_router;
use drapely_api::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "drapely_api=debug,drapely_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    let tryon_config = TryOnConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        queue_capacity = config.queue_capacity,
        publish_policy = ?tryon_config.publish_policy,
        "Loaded server configuration"
    );
    if tryon_config.api_key.is_none() {
        tracing::warn!("API_KEY not configured, authentication disabled");
    }

    // --- Pipeline worker ---
    let pipeline = Arc::new(TryOnPipeline::from_config(&tryon_config));
    let (job_queue, receiver) = queue::channel(config.queue_capacity);
    let worker_cancel = CancellationToken::new();
    let worker = TryOnWorker::new(pipeline)
        .with_drain_timeout(Duration::from_secs(config.shutdown_drain_secs));
    let worker_handle = tokio::spawn(worker.run(receiver, worker_cancel.clone()));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        tryon_config: Arc::new(tryon_config),
        queue: job_queue,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining try-on requests");
    worker_cancel.cancel();
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "Try-on worker task failed");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
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
