//! Application bootstrap and lifecycle.
//!
//! [`App`] wires the compression service into the HTTP router, binds the
//! listener, and serves until a shutdown signal arrives. Shutdown cancels
//! the application token, which propagates through per-request child tokens
//! to every in-flight pipeline, then waits for open connections to drain.

mod error;

pub use error::AppError;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::server::{router, AppState};
use crate::service::CompressionService;

/// The pixelpress application.
pub struct App {
    config: AppConfig,
}

impl App {
    /// Create an application from configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Bind the listener and serve until shutdown.
    pub async fn run(self) -> Result<(), AppError> {
        let shutdown = CancellationToken::new();

        let service = Arc::new(CompressionService::new(self.config.output_dir.clone()));
        let state = AppState::new(service, self.config.output_dir.clone(), shutdown.clone());

        let listener = tokio::net::TcpListener::bind(&self.config.addr)
            .await
            .map_err(|source| AppError::Bind {
                addr: self.config.addr.clone(),
                source,
            })?;

        info!(
            version = crate::VERSION,
            addr = %self.config.addr,
            output_dir = %self.config.output_dir.display(),
            "pixelpress started"
        );

        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await
            .map_err(AppError::Serve)?;

        info!("pixelpress stopped");
        Ok(())
    }
}

/// Wait for SIGINT or SIGTERM, then cancel the application token.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
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

    info!("shutdown signal received");
    shutdown.cancel();
}
