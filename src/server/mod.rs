//! Authenticated webhook receiver
//!
//! The sync server is the only writer of the file representation at
//! runtime. It routes normalized capture events to the workflow store and
//! the credential reconciler, validating payloads at the boundary and
//! converting I/O failures into 500-class responses; the live platform is
//! never touched and never affected by a failure here.

mod routes;

use crate::config::ServerConfig;
use crate::reconcile::CredentialReconciler;
use crate::schema::SchemaClient;
use crate::workflows::WorkflowStore;
use eyre::{Context, Result};
use std::sync::Arc;

/// Shared state behind every route
pub struct AppState {
    secret: Option<String>,
    store: WorkflowStore,
    reconciler: CredentialReconciler,
}

impl AppState {
    pub fn try_new(config: &ServerConfig) -> Result<Self> {
        let schema = SchemaClient::try_new(config.platform_url.clone(), &config.base_dir)?;
        Ok(Self {
            secret: config.secret.clone(),
            store: WorkflowStore::new(&config.base_dir),
            reconciler: CredentialReconciler::new(&config.base_dir, schema),
        })
    }
}

/// Build the sync server router over shared state
pub fn build_router(state: Arc<AppState>) -> axum::Router {
    routes::router(state)
}

/// Run the sync server until a shutdown signal arrives.
///
/// Stops accepting new connections on SIGINT/SIGTERM, drains in-flight
/// requests, then returns.
pub async fn run(config: ServerConfig) -> Result<()> {
    if config.secret.is_none() {
        log::warn!("no webhook secret configured, accepting unauthenticated requests");
    }

    let state = Arc::new(AppState::try_new(&config)?);
    let router = build_router(state);

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind sync server to {bind_address}"))?;
    log::info!("sync server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Sync server failed")?;

    log::info!("sync server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install interrupt handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install terminate handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining in-flight requests");
}
