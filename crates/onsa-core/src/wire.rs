//! JSON bodies of the HTTP surface, shared by the server and [`A2aClient`].
//!
//! [`A2aClient`]: crate::client::A2aClient

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::health::HealthRecord;
use crate::metrics::{AgentMetrics, RegistryStats};
use crate::protocol::{AgentDescriptor, AgentStatus};

/// `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Liveness marker
    pub status: String,
    /// Endpoint name to path
    pub endpoints: BTreeMap<String, String>,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Liveness marker
    pub status: String,
    /// Time the report was built
    pub timestamp: DateTime<Utc>,
    /// Registry aggregate
    pub registry: RegistryStats,
}

/// `GET /metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Registry aggregate
    pub overall: RegistryStats,
    /// Keyed by agent display name
    pub agents: BTreeMap<String, AgentMetrics>,
    /// Live connections
    pub connections: ConnectionCounts,
}

/// Live transport connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCounts {
    /// Open WebSocket sessions
    pub websocket: usize,
}

/// `POST /a2a/discovery` body. Both filters are optional and AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryFilter {
    /// Declared status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
    /// Advertised capability name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
}

/// `POST /a2a/discovery` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    /// Matching descriptors
    pub agents: Vec<AgentDescriptor>,
    /// Number of matching descriptors
    pub count: usize,
    /// Time the report was built
    pub timestamp: DateTime<Utc>,
}

/// `GET /a2a/agents/{agent_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Descriptor
    pub agent: AgentDescriptor,
    /// Monitored health
    pub health: HealthRecord,
    /// Request counters
    pub metrics: AgentMetrics,
}

/// One provider of a capability in [`CapabilitiesResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityProvider {
    /// Providing agent
    pub agent_id: String,
    /// Providing agent display name
    pub agent_name: String,
    /// Capability description
    pub description: String,
    /// Long-running hint
    #[serde(rename = "async")]
    pub async_execution: bool,
}

/// `GET /a2a/capabilities`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    /// Providers by capability name
    pub capabilities: BTreeMap<String, Vec<CapabilityProvider>>,
    /// Distinct capability names
    pub total_capabilities: usize,
    /// Registered agents
    pub total_agents: usize,
}

impl CapabilitiesResponse {
    /// Group every agent's capabilities by name. Providers keep agent order.
    pub fn aggregate(agents: &[AgentDescriptor]) -> Self {
        let mut capabilities: BTreeMap<String, Vec<CapabilityProvider>> = BTreeMap::new();
        for agent in agents {
            for capability in &agent.capabilities {
                capabilities
                    .entry(capability.name.clone())
                    .or_default()
                    .push(CapabilityProvider {
                        agent_id: agent.agent_id.clone(),
                        agent_name: agent.name.clone(),
                        description: capability.description.clone(),
                        async_execution: capability.async_execution,
                    });
            }
        }

        Self {
            total_capabilities: capabilities.len(),
            total_agents: agents.len(),
            capabilities,
        }
    }
}

/// Error body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub detail: String,
}
