//! checkout-server — flash-sale checkout core
//!
//! Long-running service that:
//! - Serves product availability backed by an advisory Redis counter
//! - Creates time-bounded stock holds under per-product locking
//! - Converts holds into pending-payment orders
//! - Settles payment webhooks idempotently, tolerating out-of-order delivery
//! - Sweeps expired holds back into available stock

use checkout_server::{api, sweeper, AppState, Config};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkout_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env();

    tracing::info!("Starting checkout-server (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    let shutdown = CancellationToken::new();

    // Background release pipeline: sweeper dispatches, worker releases
    let (jobs_tx, jobs_rx) = mpsc::channel::<i64>(1024);

    let worker = sweeper::ReleaseWorker::new(state.holds.clone(), shutdown.clone());
    let worker_handle = tokio::spawn(worker.run(jobs_rx));

    let sweeper_handle = if config.sweeper_enabled {
        let sweep = sweeper::ExpirySweeper::new(
            state.pool.clone(),
            state.redis.clone(),
            jobs_tx,
            shutdown.clone(),
        );
        Some(tokio::spawn(sweep.run()))
    } else {
        tracing::info!("Expiry sweeper disabled by configuration");
        drop(jobs_tx);
        None
    };

    // Start HTTP server
    let app = api::create_router(state);
    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("checkout-server HTTP listening on {http_addr}");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    // Drain background tasks
    if let Some(handle) = sweeper_handle {
        let _ = handle.await;
    }
    let _ = worker_handle.await;

    tracing::info!("checkout-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
