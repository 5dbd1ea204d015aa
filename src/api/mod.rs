//! HTTP surface of the simulator.
//!
//! Every request goes through one fallback handler that hands method, path
//! and query to [`dispatch::dispatch`]:
//! - `/meter/reading`, `/meter/latest`, `/meter/change-scenario`
//! - `/light/set`, `/light/status` and their `/rpc/Light.*` aliases

pub mod dispatch;
pub mod forward;
mod handlers;
pub mod params;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::forward::DeviceForwarder;
use crate::sim::context::SimContext;

/// State shared across all request handlers.
///
/// The simulation sits behind one async mutex, so requests are served
/// strictly one after another.
pub struct AppState {
    pub sim: Mutex<SimContext>,
    /// When set, light requests go to a real device instead.
    pub forwarder: Option<DeviceForwarder>,
}

impl AppState {
    pub fn new(sim: SimContext, forwarder: Option<DeviceForwarder>) -> Self {
        Self {
            sim: Mutex::new(sim),
            forwarder,
        }
    }
}

/// Builds the axum router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handlers::handle_request)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Binds to `addr` and serves until the process stops.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "simulator listening");
    axum::serve(listener, app).await
}
