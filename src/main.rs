use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spackbot::config::Config;
use spackbot::server::{build_router, AppState};
use spackbot::worker::{job_channel, TriageWorker};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spackbot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            std::process::exit(1);
        }
    };

    let (jobs_tx, jobs_rx) = job_channel();
    let shutdown = CancellationToken::new();

    let worker = TriageWorker::new(config.clone());
    let worker_shutdown = shutdown.clone();
    let worker_handle = tokio::spawn(async move {
        worker.run(jobs_rx, worker_shutdown).await;
    });

    let app = build_router(AppState::new(config.webhook_secret.clone(), jobs_tx));

    tracing::info!(addr = %config.listen_addr, "listening");

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %config.listen_addr, "failed to bind");
            std::process::exit(1);
        }
    };

    let server_shutdown = shutdown.clone();
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        server_shutdown.cancelled().await;
    });

    tokio::select! {
        result = serve => {
            if let Err(e) = result {
                tracing::error!(error = %e, "server error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
        }
    }

    shutdown.cancel();
    let _ = worker_handle.await;
}
