//! HTTP surface: `GET /render`, `POST /render` and `GET /healthz`.

mod error;
mod handlers;
mod middleware;

pub use error::{ApiError, ErrorReport};

use axum::routing::get;
use axum::{middleware as axum_middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::options::RenderOptions;
use crate::render::Renderer;
use crate::resolver::ExistingPdfResolver;
use crate::Result;

/// Shared, read-only state handed to every request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub defaults: Arc<RenderOptions>,
    pub resolver: ExistingPdfResolver,
    pub renderer: Renderer,
}

impl AppState {
    pub fn new(defaults: RenderOptions, resolver: ExistingPdfResolver, renderer: Renderer) -> Self {
        Self {
            defaults: Arc::new(defaults),
            resolver,
            renderer,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/render",
            get(handlers::render_get).post(handlers::render_post),
        )
        .route("/healthz", get(handlers::healthz))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .with_state(state)
}

/// Serves the router on `addr` until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(error = %err, "ctrl-c handler unavailable; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
