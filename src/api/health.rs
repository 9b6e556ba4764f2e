//! Service metadata, health and metrics endpoints.

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use onsa_core::wire::{
    ConnectionCounts, HealthReport, MetricsReport, ServiceInfo as ServiceInfoBody,
};
use onsa_core::AgentRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::ServerInfo;
use crate::websocket::ConnectionTable;

pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
}

async fn root(Extension(info): Extension<ServerInfo>) -> Json<ServiceInfoBody> {
    let endpoints = [
        ("discovery", "/a2a/discovery"),
        ("capabilities", "/a2a/capabilities"),
        ("agent", "/a2a/agents/{agent_id}"),
        ("execute", "/a2a/task"),
        ("execute_on_agent", "/a2a/agents/{agent_id}/task"),
        ("websocket", "/a2a/ws/{client_id}"),
        ("health", "/health"),
        ("metrics", "/metrics"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Json(ServiceInfoBody {
        service: info.name,
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "active".to_string(),
        endpoints,
    })
}

async fn health_check(Extension(registry): Extension<Arc<AgentRegistry>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        registry: registry.stats().await,
    })
}

async fn metrics(
    Extension(registry): Extension<Arc<AgentRegistry>>,
    Extension(connections): Extension<ConnectionTable>,
) -> Json<MetricsReport> {
    let agents: BTreeMap<_, _> = registry
        .all_metrics()
        .await
        .into_iter()
        .map(|(descriptor, metrics)| (descriptor.name, metrics))
        .collect();

    Json(MetricsReport {
        overall: registry.stats().await,
        agents,
        connections: ConnectionCounts {
            websocket: connections.len().await,
        },
    })
}
