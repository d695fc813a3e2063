use crate::http::{create_router, AppState};
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

/// A bound HTTP server that owns its router and its shutdown signal.
///
/// Cancelling the shutdown token stops accepting connections and ends every
/// open relay pair.
pub struct Server {
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
}

impl Server {
    /// Bind `addr` and build the router. With `static_dir`, unmatched GETs
    /// are served from it, falling back to its `index.html`.
    pub async fn bind(addr: &str, state: AppState, static_dir: Option<&Path>) -> Result<Self> {
        let shutdown = state.shutdown.clone();
        let mut router = create_router(state);

        if let Some(dir) = static_dir {
            info!("Serving frontend from {}", dir.display());
            let spa = ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html")));
            router = router.fallback_service(spa);
        }

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        Ok(Self {
            listener,
            router,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve until the shutdown token is cancelled
    pub async fn run(self) -> Result<()> {
        let addr = self.local_addr()?;
        info!("Listening on http://{}", addr);

        let shutdown = self.shutdown.clone();
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("HTTP server failed")?;

        info!("Server on {} stopped", addr);
        Ok(())
    }
}
