//! HTTP server.
//!
//! A read-only JSON surface over the services:
//! - entity summaries with indicators
//! - research product listings, plots and exports
//! - keyword search

mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;

use crate::services::Services;

/// Quyca HTTP server.
pub struct QuycaServer {
    services: Services,
}

impl QuycaServer {
    /// Create a new server.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Serve on all interfaces until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be bound or the server fails.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        let router = create_router(self.services);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!("HTTP server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for QuycaServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuycaServer").field("services", &self.services).finish()
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // Without a handler the server runs until killed.
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
