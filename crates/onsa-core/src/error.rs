//! Error types for onsa-core
//!
//! Two layers of failure:
//! - [`Error`]: the request could not be routed (no agent, no healthy agent,
//!   bad message). These surface as transport-level errors.
//! - [`AgentError`]: the agent was invoked and its work failed. The dispatcher
//!   turns these into a `failed` task response instead of an error.

use thiserror::Error;

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown agent or capability with zero providers
    NotFound,
    /// Capability exists but no provider is currently healthy
    ServiceUnavailable,
    /// Malformed message or capability not advertised by the agent
    BadRequest,
    /// Agent handle does not implement the capability
    NotImplemented,
    /// Registry inconsistency (e.g. descriptor without handle)
    Internal,
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No agent registered under this id
    #[error("Agent {0} not found")]
    AgentNotFound(String),

    /// No agent advertises the capability
    #[error("No agents found with capability '{0}'")]
    CapabilityNotFound(String),

    /// Every provider of the capability is unhealthy
    #[error("No healthy agents available for capability '{0}'")]
    NoHealthyAgent(String),

    /// Specific-agent dispatch to an agent that does not list the capability
    #[error("Agent {agent_id} does not have capability '{capability}'")]
    CapabilityNotAdvertised {
        /// Target agent
        agent_id: String,
        /// Requested capability
        capability: String,
    },

    /// Descriptor registered without an invocable handle
    #[error("Agent instance not available for {0}")]
    AgentNotInvocable(String),

    /// Handle rejected the capability name
    #[error("Capability '{0}' not implemented")]
    NotImplemented(String),

    /// Protocol message failed validation
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl Error {
    /// Classify the error for transport mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AgentNotFound(_) | Error::CapabilityNotFound(_) => ErrorKind::NotFound,
            Error::NoHealthyAgent(_) => ErrorKind::ServiceUnavailable,
            Error::CapabilityNotAdvertised { .. } | Error::InvalidMessage(_) => {
                ErrorKind::BadRequest
            }
            Error::NotImplemented(_) => ErrorKind::NotImplemented,
            Error::AgentNotInvocable(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by an agent handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// The handle has no implementation for the capability
    #[error("capability '{0}' is not supported by this agent")]
    UnsupportedCapability(String),

    /// Parameters did not match what the capability expects
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The agent (or its upstream) could not be reached
    #[error("agent unavailable: {0}")]
    Unavailable(String),

    /// The capability ran and failed
    #[error("{0}")]
    Failed(String),
}
