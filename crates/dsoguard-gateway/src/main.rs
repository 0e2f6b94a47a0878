//! dsoguard gateway binary.
//!
//! - `POST /v1/load`, `POST /v1/save`: regulated requests
//! - Config path from `DSOGUARD_CONFIG` (default `dsoguard.yaml`)
//! - Graceful shutdown on Ctrl+C / SIGTERM; `/readyz` reports draining

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dsoguard_gateway::{app_state::AppState, config, router};

const PURGE_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "dsoguard-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.gateway.listen.parse()?;

    let state = AppState::new(cfg)?;

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(PURGE_EVERY);
        loop {
            tick.tick().await;
            let purged = sweeper.sessions().purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "expired sessions removed");
            }
        }
    });

    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "dsoguard-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            state.metrics().set_draining();
        })
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
