//! Onsa Core - Agent-to-Agent coordination
//!
//! This crate provides the pieces of an A2A server that do not depend on a
//! transport:
//! - Protocol: message envelope, task request/response, agent descriptors
//! - Registry: registered agents, their health and request metrics
//! - Health: the probe state machine driven by the registry's monitor loop
//! - Dispatcher: capability routing (any healthy agent or a specific one)
//! - Client: HTTP client for a running server, and remote agent proxies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod client;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod remote;
pub mod wire;

pub use agent::{Agent, AgentHandle, EchoAgent};
pub use client::{A2aClient, ClientError};
pub use dispatcher::{AgentRef, DispatchOutcome, TaskDispatcher};
pub use error::{AgentError, Error, ErrorKind, Result};
pub use health::{HealthRecord, HealthStatus, ProbeOutcome};
pub use metrics::{AgentMetrics, RegistryStats};
pub use protocol::{
    AgentDescriptor, AgentStatus, Capability, MessageType, Parameters, ProtocolMessage,
    TaskRequest, TaskResponse, TaskStatus,
};
pub use registry::{AgentRegistry, RegistryConfig};
pub use remote::RemoteAgent;
