// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::monitor::MonitorRegistry;
use crate::sampler::Sampler;

pub(crate) struct AppState<S> {
    pub(crate) registry: Arc<MonitorRegistry<S>>,
    /// Serves GET /api/metrics; None when this host does not expose its own metrics.
    pub(crate) metrics_source: Option<Arc<S>>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            metrics_source: self.metrics_source.clone(),
            ws_connections: self.ws_connections.clone(),
        }
    }
}

pub fn app<S: Sampler + 'static>(
    registry: Arc<MonitorRegistry<S>>,
    metrics_source: Option<Arc<S>>,
    ws_connections: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        registry,
        metrics_source,
        ws_connections,
    };
    Router::new()
        .route("/", get(|| async { "Hello from homeserver monitor!" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/metrics", get(http::metrics_handler::<S>)) // GET /api/metrics
        .route("/api/monitors", get(http::list_monitors::<S>)) // GET /api/monitors
        .route("/api/monitors/{name}", get(http::monitor_status::<S>)) // GET /api/monitors/{name}
        .route(
            "/api/monitors/{name}/history/{*resource}",
            get(http::monitor_history::<S>),
        ) // GET /api/monitors/{name}/history/{resource}?limit=N
        .route("/ws/monitors/{name}", get(ws::ws_monitor::<S>)) // WS /ws/monitors/{name}
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
