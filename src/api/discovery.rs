//! Agent discovery endpoints

use axum::body::Bytes;
use axum::extract::{Extension, Path};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use onsa_core::wire::{AgentInfo, CapabilitiesResponse, DiscoveryFilter, DiscoveryResponse};
use onsa_core::{AgentRegistry, Error};
use std::sync::Arc;

use super::error::{ApiError, ApiResult};

pub fn discovery_routes() -> Router {
    Router::new()
        .route("/a2a/discovery", post(discover_agents))
        .route("/a2a/agents/:agent_id", get(get_agent_info))
        .route("/a2a/capabilities", get(get_capabilities))
}

/// The body is optional; an empty body means no filter.
async fn discover_agents(
    Extension(registry): Extension<Arc<AgentRegistry>>,
    body: Bytes,
) -> ApiResult<DiscoveryResponse> {
    let filter = if body.iter().all(u8::is_ascii_whitespace) {
        DiscoveryFilter::default()
    } else {
        serde_json::from_slice::<Option<DiscoveryFilter>>(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid discovery filter: {}", e)))?
            .unwrap_or_default()
    };

    let agents = registry
        .list(filter.status, filter.capability.as_deref())
        .await;

    Ok(Json(DiscoveryResponse {
        count: agents.len(),
        agents,
        timestamp: Utc::now(),
    }))
}

async fn get_agent_info(
    Extension(registry): Extension<Arc<AgentRegistry>>,
    Path(agent_id): Path<String>,
) -> ApiResult<AgentInfo> {
    let not_found = || ApiError::from(Error::AgentNotFound(agent_id.clone()));

    let agent = registry.lookup(&agent_id).await.ok_or_else(not_found)?;
    let health = registry.agent_health(&agent_id).await.ok_or_else(not_found)?;
    let metrics = registry.agent_metrics(&agent_id).await.ok_or_else(not_found)?;

    Ok(Json(AgentInfo {
        agent,
        health,
        metrics,
    }))
}

async fn get_capabilities(
    Extension(registry): Extension<Arc<AgentRegistry>>,
) -> Json<CapabilitiesResponse> {
    let agents = registry.list(None, None).await;
    Json(CapabilitiesResponse::aggregate(&agents))
}
