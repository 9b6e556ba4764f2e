//! Agent invocation contract.
//!
//! Every registrable agent implements [`Agent`]. The registry only ever sees
//! the trait object; what the agent does behind `invoke` (an LLM call, a
//! provider lookup, a proxy to another server) is opaque to it.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::AgentError;
use crate::protocol::Parameters;

/// A capability provider.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Execute `capability` with `parameters`.
    ///
    /// Return [`AgentError::UnsupportedCapability`] when the handle has no
    /// implementation for the name; any other error is reported to the caller
    /// as a failed task.
    async fn invoke(&self, capability: &str, parameters: Parameters) -> Result<Value, AgentError>;

    /// Liveness probe. `Ok(false)` counts towards the unhealthy threshold,
    /// `Err` marks the agent as errored.
    ///
    /// Agents without a meaningful probe are healthy as long as they exist.
    async fn health_check(&self) -> Result<bool, AgentError> {
        Ok(true)
    }
}

/// Shared handle stored by the registry.
pub type AgentHandle = Arc<dyn Agent>;

/// Demo agent exposing the `echo` capability.
#[derive(Debug, Default, Clone)]
pub struct EchoAgent;

impl EchoAgent {
    /// Capability name served by this agent.
    pub const CAPABILITY: &'static str = "echo";

    /// Descriptor for registering the echo agent under `agent_id`.
    pub fn descriptor(agent_id: impl Into<String>) -> crate::protocol::AgentDescriptor {
        crate::protocol::AgentDescriptor::new(
            agent_id,
            "Echo Agent",
            "Returns its parameters unchanged",
            env!("CARGO_PKG_VERSION"),
        )
        .with_capability(
            crate::protocol::Capability::new(Self::CAPABILITY, "Echo the input parameters")
                .with_schemas(
                    serde_json::json!({"type": "object"}),
                    serde_json::json!({"type": "object"}),
                ),
        )
    }
}

#[async_trait]
impl Agent for EchoAgent {
    async fn invoke(&self, capability: &str, parameters: Parameters) -> Result<Value, AgentError> {
        match capability {
            Self::CAPABILITY => Ok(Value::Object(parameters)),
            other => Err(AgentError::UnsupportedCapability(other.to_string())),
        }
    }
}
