//! Task Dispatcher
//!
//! Routes a [`TaskRequest`] to exactly one agent and turns the invocation
//! into a [`TaskResponse`]. Two modes:
//!
//! - **any agent**: first healthy provider of the capability, in
//!   registration order
//! - **specific agent**: the named agent, whatever its health
//!
//! Selection failures are request-level [`Error`]s; an agent that runs and
//! fails produces a `failed` task instead.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::AgentHandle;
use crate::error::{AgentError, Error, Result};
use crate::protocol::{AgentDescriptor, TaskRequest, TaskResponse};
use crate::registry::AgentRegistry;

/// Agent that served a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
    /// Agent id
    pub id: String,
    /// Agent display name
    pub name: String,
}

impl From<&AgentDescriptor> for AgentRef {
    fn from(descriptor: &AgentDescriptor) -> Self {
        Self {
            id: descriptor.agent_id.clone(),
            name: descriptor.name.clone(),
        }
    }
}

/// Result of a dispatch that reached an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Task result (completed or failed)
    pub task: TaskResponse,
    /// Serving agent
    pub agent: AgentRef,
    /// Wall-clock invocation time
    pub duration_ms: u64,
}

/// Capability router over a shared registry.
#[derive(Clone)]
pub struct TaskDispatcher {
    registry: Arc<AgentRegistry>,
}

impl TaskDispatcher {
    /// Create a dispatcher reading from `registry`.
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    /// Registry this dispatcher routes over.
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Execute on the first healthy agent advertising the capability.
    pub async fn dispatch(&self, request: TaskRequest) -> Result<DispatchOutcome> {
        let (descriptor, handle) = self
            .registry
            .select_healthy(&request.capability_name)
            .await?;
        let handle = handle.ok_or_else(|| Error::AgentNotInvocable(descriptor.agent_id.clone()))?;

        debug!(
            agent_id = %descriptor.agent_id,
            capability = %request.capability_name,
            task_id = %request.task_id,
            "Selected agent"
        );
        self.execute(&descriptor, handle, request).await
    }

    /// Execute on `agent_id`. Health is not consulted.
    pub async fn dispatch_to(
        &self,
        agent_id: &str,
        request: TaskRequest,
    ) -> Result<DispatchOutcome> {
        let descriptor = self
            .registry
            .lookup(agent_id)
            .await
            .ok_or_else(|| Error::AgentNotFound(agent_id.to_string()))?;

        if !descriptor.has_capability(&request.capability_name) {
            return Err(Error::CapabilityNotAdvertised {
                agent_id: agent_id.to_string(),
                capability: request.capability_name,
            });
        }

        let handle = self
            .registry
            .get_handle(agent_id)
            .await
            .ok_or_else(|| Error::AgentNotInvocable(agent_id.to_string()))?;

        self.execute(&descriptor, handle, request).await
    }

    async fn execute(
        &self,
        descriptor: &AgentDescriptor,
        handle: AgentHandle,
        request: TaskRequest,
    ) -> Result<DispatchOutcome> {
        let TaskRequest {
            task_id,
            capability_name,
            parameters,
            ..
        } = request;
        let agent_id = descriptor.agent_id.as_str();

        let started_at = Utc::now();
        let start = Instant::now();
        let result = handle.invoke(&capability_name, parameters).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let task = match result {
            Ok(value) => {
                self.registry.record_request(agent_id, true, duration_ms).await;
                info!(
                    agent_id = %agent_id,
                    capability = %capability_name,
                    task_id = %task_id,
                    duration_ms,
                    "Task completed"
                );
                TaskResponse::completed(task_id, value, started_at)
            }
            Err(AgentError::UnsupportedCapability(name)) => {
                warn!(
                    agent_id = %agent_id,
                    capability = %name,
                    "Agent does not implement capability"
                );
                return Err(Error::NotImplemented(name));
            }
            Err(e) => {
                self.registry.record_request(agent_id, false, duration_ms).await;
                warn!(
                    agent_id = %agent_id,
                    capability = %capability_name,
                    task_id = %task_id,
                    error = %e,
                    "Task failed"
                );
                TaskResponse::failed(task_id, e.to_string(), started_at)
            }
        };

        Ok(DispatchOutcome {
            task,
            agent: AgentRef::from(descriptor),
            duration_ms,
        })
    }
}
