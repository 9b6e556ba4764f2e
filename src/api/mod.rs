//! HTTP API for the A2A server
//!
//! Provides:
//! - Service metadata, health and metrics
//! - Agent discovery and capability listing
//! - Task execution (any healthy agent, or a specific one)

pub mod discovery;
pub mod error;
pub mod health;
pub mod tasks;

use axum::{Extension, Router};
use onsa_core::{AgentRegistry, TaskDispatcher};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use discovery::discovery_routes;
pub use health::health_routes;
pub use tasks::task_routes;

use crate::server::config::{AppConfig, WebSocketConfig};
use crate::websocket::{ws_routes, ConnectionTable};

/// Identity the server reports and stamps on protocol messages.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub sender_id: String,
}

impl From<&AppConfig> for ServerInfo {
    fn from(config: &AppConfig) -> Self {
        Self {
            name: config.server.name.clone(),
            sender_id: config.server.sender_id.clone(),
        }
    }
}

/// Everything the router hands to its handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
    pub connections: ConnectionTable,
    pub info: ServerInfo,
    pub websocket: WebSocketConfig,
}

/// Assemble the full router: HTTP API plus the WebSocket endpoint.
pub fn app_router(state: AppState) -> Router {
    let dispatcher = Arc::new(TaskDispatcher::new(state.registry.clone()));

    Router::new()
        .merge(health_routes())
        .merge(discovery_routes())
        .merge(task_routes())
        .merge(ws_routes())
        .layer(Extension(state.registry))
        .layer(Extension(dispatcher))
        .layer(Extension(state.connections))
        .layer(Extension(state.info))
        .layer(Extension(state.websocket))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
