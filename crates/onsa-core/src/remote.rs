//! Agents served by a peer A2A server.
//!
//! A [`RemoteAgent`] registers locally like any other agent; invocations are
//! forwarded to `POST {endpoint}/a2a/agents/{agent_id}/task` and probes read
//! the peer's own health record from `GET {endpoint}/a2a/agents/{agent_id}`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::agent::Agent;
use crate::client::{A2aClient, ClientError};
use crate::error::AgentError;
use crate::health::HealthStatus;
use crate::protocol::{AgentDescriptor, Parameters, TaskRequest};

/// Proxy to an agent hosted by another server.
#[derive(Debug, Clone)]
pub struct RemoteAgent {
    client: A2aClient,
    remote_id: String,
}

impl RemoteAgent {
    /// Proxy to `remote_id` on the server behind `client`.
    pub fn new(client: A2aClient, remote_id: impl Into<String>) -> Self {
        Self {
            client,
            remote_id: remote_id.into(),
        }
    }

    /// Fetch the peer's descriptor and build the proxy.
    ///
    /// The returned descriptor is re-keyed to `local_id` when one is given so
    /// the same remote agent can be registered under a local name.
    pub async fn connect(
        client: A2aClient,
        remote_id: &str,
        local_id: Option<&str>,
    ) -> Result<(AgentDescriptor, Self), ClientError> {
        let info = client.agent_info(remote_id).await?;
        let mut descriptor = info.agent;
        if let Some(local_id) = local_id {
            descriptor.agent_id = local_id.to_string();
        }
        debug!(
            endpoint = %client.base_url(),
            remote_id = %remote_id,
            local_id = %descriptor.agent_id,
            "Resolved peer agent"
        );
        Ok((descriptor, Self::new(client, remote_id)))
    }

    /// Agent id on the peer.
    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    /// Peer base URL.
    pub fn endpoint(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl Agent for RemoteAgent {
    async fn invoke(&self, capability: &str, parameters: Parameters) -> Result<Value, AgentError> {
        let request = TaskRequest::new(capability, parameters);
        match self.client.execute_on(&self.remote_id, &request).await {
            Ok(outcome) if outcome.task.is_completed() => {
                Ok(outcome.task.result.unwrap_or(Value::Null))
            }
            Ok(outcome) => Err(AgentError::Failed(
                outcome
                    .task
                    .error
                    .unwrap_or_else(|| "remote task failed".to_string()),
            )),
            Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_IMPLEMENTED => {
                Err(AgentError::UnsupportedCapability(capability.to_string()))
            }
            Err(e) => Err(AgentError::Unavailable(format!(
                "{} ({})",
                e,
                self.client.base_url()
            ))),
        }
    }

    /// Healthy only while the peer still has the agent and monitors it as
    /// healthy. A reachable peer that rejects the lookup counts as a failed
    /// probe; an unreachable one is a probe error.
    async fn health_check(&self) -> Result<bool, AgentError> {
        match self.client.agent_info(&self.remote_id).await {
            Ok(info) => Ok(info.health.status == HealthStatus::Healthy),
            Err(ClientError::Status { status, detail }) => {
                debug!(
                    endpoint = %self.client.base_url(),
                    remote_id = %self.remote_id,
                    status = %status,
                    detail = %detail,
                    "Peer rejected agent lookup"
                );
                Ok(false)
            }
            Err(e) => Err(AgentError::Unavailable(e.to_string())),
        }
    }
}
