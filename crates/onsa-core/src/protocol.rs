//! A2A (Agent-to-Agent) wire protocol.
//!
//! Value types shared by the registry, the dispatcher and both transports:
//!
//! - [`Capability`] / [`AgentDescriptor`]: what an agent is and what it can do
//! - [`ProtocolMessage`]: the envelope used for HTTP bodies and WebSocket frames
//! - [`TaskRequest`] / [`TaskResponse`]: capability execution
//!
//! Envelope payloads are validated against their `message_type` when a message
//! is deserialized or built with [`ProtocolMessage::new`], so an invalid
//! combination never enters the system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Free-form structured map used for payloads and task parameters.
pub type Parameters = Map<String, Value>;

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// One operation exposed by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Capability name, unique within one agent
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema of the parameters (opaque to the registry)
    #[serde(default)]
    pub input_schema: Value,
    /// JSON schema of the result (opaque to the registry)
    #[serde(default)]
    pub output_schema: Value,
    /// Example inputs/outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Value>>,
    /// Hint that the capability may run long
    #[serde(default)]
    pub async_execution: bool,
    /// Estimated execution time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_ms: Option<u64>,
}

impl Capability {
    /// Create a capability with empty object schemas.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: Value::Object(Map::new()),
            output_schema: Value::Object(Map::new()),
            examples: None,
            async_execution: false,
            estimated_duration_ms: None,
        }
    }

    /// Set input and output schemas.
    pub fn with_schemas(mut self, input: Value, output: Value) -> Self {
        self.input_schema = input;
        self.output_schema = output;
        self
    }

    /// Mark the capability as long-running.
    pub fn with_async_execution(mut self, estimated_duration_ms: Option<u64>) -> Self {
        self.async_execution = true;
        self.estimated_duration_ms = estimated_duration_ms;
        self
    }
}

/// Declared agent status (distinct from monitored health).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Accepting work
    #[default]
    Active,
    /// Registered but declared out of service
    Inactive,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for AgentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(Error::InvalidMessage(format!(
                "unknown agent status '{}'",
                other
            ))),
        }
    }
}

/// Identity, metadata and capabilities of a registered agent.
///
/// Deserialization rejects descriptors that repeat a capability name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAgentDescriptor")]
pub struct AgentDescriptor {
    /// Globally unique agent id
    pub agent_id: String,
    /// Agent name
    pub name: String,
    /// Agent description
    pub description: String,
    /// Agent version
    pub version: String,
    /// Capabilities in registration order
    pub capabilities: Vec<Capability>,
    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Parameters>,
    /// Declared status
    pub status: AgentStatus,
    /// Last descriptor mutation
    pub last_updated: DateTime<Utc>,
}

/// Unvalidated wire shape of [`AgentDescriptor`].
#[derive(Debug, Deserialize)]
struct RawAgentDescriptor {
    #[serde(default = "generate_id")]
    agent_id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    capabilities: Vec<Capability>,
    #[serde(default)]
    metadata: Option<Parameters>,
    #[serde(default)]
    status: AgentStatus,
    #[serde(default = "Utc::now")]
    last_updated: DateTime<Utc>,
}

impl TryFrom<RawAgentDescriptor> for AgentDescriptor {
    type Error = Error;

    fn try_from(raw: RawAgentDescriptor) -> Result<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = raw.capabilities.iter().find(|c| !seen.insert(c.name.as_str())) {
            return Err(Error::InvalidMessage(format!(
                "Duplicate capability '{}' for agent {}",
                dup.name, raw.agent_id
            )));
        }
        Ok(Self {
            agent_id: raw.agent_id,
            name: raw.name,
            description: raw.description,
            version: raw.version,
            capabilities: raw.capabilities,
            metadata: raw.metadata,
            status: raw.status,
            last_updated: raw.last_updated,
        })
    }
}

impl AgentDescriptor {
    /// Create an active descriptor with no capabilities.
    pub fn new(
        agent_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            description: description.into(),
            version: version.into(),
            capabilities: Vec::new(),
            metadata: None,
            status: AgentStatus::Active,
            last_updated: Utc::now(),
        }
    }

    /// Create a descriptor with a generated agent id.
    pub fn with_generated_id(
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::new(generate_id(), name, description, version)
    }

    /// Add a capability. A capability with the same name is replaced in place.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        match self
            .capabilities
            .iter_mut()
            .find(|c| c.name == capability.name)
        {
            Some(existing) => *existing = capability,
            None => self.capabilities.push(capability),
        }
        self.last_updated = Utc::now();
        self
    }

    /// Set declared status.
    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self.last_updated = Utc::now();
        self
    }

    /// Exact, case-sensitive capability lookup.
    pub fn capability(&self, name: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.name == name)
    }

    /// Whether the agent advertises `name`.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capability(name).is_some()
    }

    /// Collapse repeated capability names, keeping the first position and the
    /// last definition. Returns how many entries were dropped.
    pub(crate) fn dedup_capabilities(&mut self) -> usize {
        let before = self.capabilities.len();
        let mut unique: Vec<Capability> = Vec::with_capacity(before);
        for capability in self.capabilities.drain(..) {
            match unique.iter_mut().find(|c| c.name == capability.name) {
                Some(existing) => *existing = capability,
                None => unique.push(capability),
            }
        }
        self.capabilities = unique;
        before - self.capabilities.len()
    }
}

/// Envelope message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Discovery request
    DiscoverAgents,
    /// Discovery reply
    AgentInfo,
    /// Capability listing request
    GetCapabilities,
    /// Capability listing reply
    CapabilitiesResponse,
    /// Capability execution request
    ExecuteTask,
    /// Capability execution result
    TaskResponse,
    /// Task progress/acknowledgement
    TaskStatus,
    /// Free-form message
    Message,
    /// Free-form query
    Query,
    /// Free-form reply
    Response,
    /// Liveness request
    Ping,
    /// Liveness reply
    Pong,
    /// Error report
    Error,
}

impl MessageType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiscoverAgents => "discover_agents",
            Self::AgentInfo => "agent_info",
            Self::GetCapabilities => "get_capabilities",
            Self::CapabilitiesResponse => "capabilities_response",
            Self::ExecuteTask => "execute_task",
            Self::TaskResponse => "task_response",
            Self::TaskStatus => "task_status",
            Self::Message => "message",
            Self::Query => "query",
            Self::Response => "response",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Error => "error",
        }
    }

    /// Payload keys that must be present for this type.
    pub fn required_payload_fields(&self) -> &'static [&'static str] {
        match self {
            Self::ExecuteTask => &["capability_name", "parameters"],
            Self::TaskResponse | Self::TaskStatus => &["task_id", "status"],
            Self::Error => &["error"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `payload` carries the keys `message_type` requires.
pub fn validate_payload(message_type: MessageType, payload: &Parameters) -> Result<()> {
    for field in message_type.required_payload_fields() {
        if !payload.contains_key(*field) {
            return Err(Error::InvalidMessage(format!(
                "Missing required field '{}' for {}",
                field, message_type
            )));
        }
    }

    if message_type == MessageType::ExecuteTask {
        if !payload["capability_name"].is_string() {
            return Err(Error::InvalidMessage(
                "'capability_name' must be a string".to_string(),
            ));
        }
        if !payload["parameters"].is_object() {
            return Err(Error::InvalidMessage(
                "'parameters' must be an object".to_string(),
            ));
        }
    }

    Ok(())
}

/// The protocol envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProtocolMessage")]
pub struct ProtocolMessage {
    /// Unique message id
    pub message_id: String,
    /// Envelope type
    pub message_type: MessageType,
    /// Sending agent or system
    pub sender_id: String,
    /// Recipient (`None` = broadcast)
    pub recipient_id: Option<String>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Type-dependent payload
    pub payload: Parameters,
    /// Id of the message this one answers
    pub correlation_id: Option<String>,
    /// Whether the sender expects a reply
    pub requires_response: bool,
}

/// Unvalidated wire shape of [`ProtocolMessage`].
#[derive(Debug, Deserialize)]
struct RawProtocolMessage {
    #[serde(default = "generate_id")]
    message_id: String,
    message_type: MessageType,
    sender_id: String,
    #[serde(default)]
    recipient_id: Option<String>,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    payload: Parameters,
    #[serde(default)]
    correlation_id: Option<String>,
    #[serde(default)]
    requires_response: bool,
}

impl TryFrom<RawProtocolMessage> for ProtocolMessage {
    type Error = Error;

    fn try_from(raw: RawProtocolMessage) -> Result<Self> {
        validate_payload(raw.message_type, &raw.payload)?;
        Ok(Self {
            message_id: raw.message_id,
            message_type: raw.message_type,
            sender_id: raw.sender_id,
            recipient_id: raw.recipient_id,
            timestamp: raw.timestamp,
            payload: raw.payload,
            correlation_id: raw.correlation_id,
            requires_response: raw.requires_response,
        })
    }
}

impl ProtocolMessage {
    /// Build a validated message.
    pub fn new(
        message_type: MessageType,
        sender_id: impl Into<String>,
        payload: Parameters,
    ) -> Result<Self> {
        validate_payload(message_type, &payload)?;
        Ok(Self::unchecked(message_type, sender_id.into(), payload))
    }

    fn unchecked(message_type: MessageType, sender_id: String, payload: Parameters) -> Self {
        Self {
            message_id: generate_id(),
            message_type,
            sender_id,
            recipient_id: None,
            timestamp: Utc::now(),
            payload,
            correlation_id: None,
            requires_response: false,
        }
    }

    /// Parse and validate a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidMessage(e.to_string()))
    }

    /// Address the message to `recipient`.
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.recipient_id = Some(recipient.into());
        self
    }

    /// Correlate with the message that caused this one.
    pub fn correlated_with(mut self, message_id: impl Into<String>) -> Self {
        self.correlation_id = Some(message_id.into());
        self
    }

    /// Mark the message as expecting a reply.
    pub fn expecting_response(mut self) -> Self {
        self.requires_response = true;
        self
    }

    /// `pong` reply carrying the current time.
    pub fn pong(sender_id: impl Into<String>) -> Self {
        let mut payload = Parameters::new();
        payload.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));
        Self::unchecked(MessageType::Pong, sender_id.into(), payload)
    }

    /// `task_status` message for a task.
    pub fn task_status(
        sender_id: impl Into<String>,
        task_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        let mut payload = Parameters::new();
        payload.insert("task_id".into(), Value::String(task_id.into()));
        payload.insert("status".into(), Value::String(status.into()));
        Self::unchecked(MessageType::TaskStatus, sender_id.into(), payload)
    }

    /// `task_response` message wrapping a finished task.
    pub fn task_response(sender_id: impl Into<String>, response: &TaskResponse) -> Self {
        Self::unchecked(
            MessageType::TaskResponse,
            sender_id.into(),
            response.to_payload(),
        )
    }

    /// `error` message. `original_type` is `None` when the offending frame
    /// could not be parsed far enough to know its type.
    pub fn error(
        sender_id: impl Into<String>,
        error: impl Into<String>,
        original_type: Option<&str>,
    ) -> Self {
        let mut payload = Parameters::new();
        payload.insert("error".into(), Value::String(error.into()));
        payload.insert(
            "original_message_type".into(),
            original_type.map_or(Value::Null, |t| Value::String(t.to_string())),
        );
        payload.insert("timestamp".into(), Value::String(Utc::now().to_rfc3339()));
        Self::unchecked(MessageType::Error, sender_id.into(), payload)
    }
}

/// Request to execute a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Task id (generated if absent)
    #[serde(default = "generate_id")]
    pub task_id: String,
    /// Capability to execute
    pub capability_name: String,
    /// Parameters passed verbatim to the agent
    pub parameters: Parameters,
    /// Caller hint; dispatch is synchronous regardless
    #[serde(default)]
    pub async_execution: bool,
    /// Callback for async delivery (accepted, not used)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Caller timeout hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Parameters>,
}

impl TaskRequest {
    /// Create a request with a generated task id.
    pub fn new(capability_name: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            task_id: generate_id(),
            capability_name: capability_name.into(),
            parameters,
            async_execution: false,
            callback_url: None,
            timeout_ms: None,
            context: None,
        }
    }

    /// Parse an `execute_task` payload.
    pub fn from_payload(payload: &Parameters) -> Result<Self> {
        serde_json::from_value(Value::Object(payload.clone()))
            .map_err(|e| Error::InvalidMessage(format!("invalid task request: {}", e)))
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted, not started
    Pending,
    /// In progress
    Running,
    /// Finished with a result
    Completed,
    /// Finished with an error
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of a task execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Echoes the request's task id
    pub task_id: String,
    /// Task state
    pub status: TaskStatus,
    /// Present iff completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present iff failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Invocation start
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Invocation end
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Progress percentage (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Parameters>,
}

impl TaskResponse {
    /// Completed task, finished now.
    pub fn completed(task_id: impl Into<String>, result: Value, started_at: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Completed,
            result: Some(result),
            error: None,
            started_at: Some(started_at),
            completed_at: Some(Utc::now()),
            progress: Some(100.0),
            metadata: None,
        }
    }

    /// Failed task, finished now.
    pub fn failed(
        task_id: impl Into<String>,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            result: None,
            error: Some(error.into()),
            started_at: Some(started_at),
            completed_at: Some(Utc::now()),
            progress: None,
            metadata: None,
        }
    }

    /// Whether the task completed successfully.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Serialize into an envelope payload.
    pub fn to_payload(&self) -> Parameters {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => {
                let mut map = Parameters::new();
                map.insert("task_id".into(), Value::String(self.task_id.clone()));
                map.insert("status".into(), Value::String(self.status.to_string()));
                map
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_execute_task_requires_capability_and_parameters() {
        let err = ProtocolMessage::new(
            MessageType::ExecuteTask,
            "client",
            params(json!({"parameters": {}})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("capability_name"));

        let err = ProtocolMessage::new(
            MessageType::ExecuteTask,
            "client",
            params(json!({"capability_name": "echo"})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("parameters"));

        let ok = ProtocolMessage::new(
            MessageType::ExecuteTask,
            "client",
            params(json!({"capability_name": "echo", "parameters": {"v": 1}})),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_execute_task_rejects_non_object_parameters() {
        let err = ProtocolMessage::new(
            MessageType::ExecuteTask,
            "client",
            params(json!({"capability_name": "echo", "parameters": [1, 2]})),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidMessage(_)));
    }

    #[test]
    fn test_deserialization_validates_payload() {
        let text = json!({
            "message_type": "execute_task",
            "sender_id": "c1",
            "payload": {"parameters": {}}
        })
        .to_string();
        assert!(ProtocolMessage::from_json(&text).is_err());

        let text = json!({
            "message_type": "execute_task",
            "sender_id": "c1",
            "payload": {"capability_name": "echo", "parameters": {}}
        })
        .to_string();
        let msg = ProtocolMessage::from_json(&text).unwrap();
        assert_eq!(msg.message_type, MessageType::ExecuteTask);
    }

    #[test]
    fn test_defaults_filled_on_deserialization() {
        let text = r#"{"message_type":"ping","sender_id":"c1"}"#;
        let msg = ProtocolMessage::from_json(text).unwrap();
        assert!(!msg.message_id.is_empty());
        assert!(msg.payload.is_empty());
        assert!(msg.recipient_id.is_none());
        assert!(msg.correlation_id.is_none());
        assert!(!msg.requires_response);
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        let text = r#"{"message_type":"teleport","sender_id":"c1","payload":{}}"#;
        assert!(ProtocolMessage::from_json(text).is_err());
    }

    #[test]
    fn test_message_type_wire_names() {
        let json = serde_json::to_string(&MessageType::CapabilitiesResponse).unwrap();
        assert_eq!(json, "\"capabilities_response\"");
        assert_eq!(MessageType::ExecuteTask.to_string(), "execute_task");
    }

    #[test]
    fn test_error_message_shape() {
        let msg = ProtocolMessage::error("a2a-server", "boom", Some("teleport"))
            .to("client-1")
            .correlated_with("m-1");
        assert_eq!(msg.message_type, MessageType::Error);
        assert_eq!(msg.payload["error"], "boom");
        assert_eq!(msg.payload["original_message_type"], "teleport");
        assert!(msg.payload.contains_key("timestamp"));
        assert_eq!(msg.correlation_id.as_deref(), Some("m-1"));
        assert_eq!(msg.recipient_id.as_deref(), Some("client-1"));
    }

    #[test]
    fn test_task_request_from_payload_generates_id() {
        let payload = params(json!({"capability_name": "echo", "parameters": {"v": 1}}));
        let req = TaskRequest::from_payload(&payload).unwrap();
        assert_eq!(req.capability_name, "echo");
        assert!(!req.task_id.is_empty());
        assert!(!req.async_execution);
        assert_eq!(req.parameters["v"], 1);
    }

    #[test]
    fn test_task_request_keeps_caller_task_id() {
        let payload = params(json!({
            "task_id": "t-42",
            "capability_name": "echo",
            "parameters": {},
            "timeout_ms": 500
        }));
        let req = TaskRequest::from_payload(&payload).unwrap();
        assert_eq!(req.task_id, "t-42");
        assert_eq!(req.timeout_ms, Some(500));
    }

    #[test]
    fn test_task_response_result_xor_error() {
        let started = Utc::now();
        let ok = TaskResponse::completed("t1", json!({"v": 1}), started);
        assert!(ok.is_completed());
        assert!(ok.error.is_none());
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "completed");
        assert!(json.get("error").is_none());

        let failed = TaskResponse::failed("t2", "boom", started);
        assert!(!failed.is_completed());
        assert!(failed.result.is_none());
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "boom");
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_task_response_payload_passes_validation() {
        let resp = TaskResponse::completed("t1", json!(null), Utc::now());
        let msg = ProtocolMessage::task_response("a2a-server", &resp);
        assert!(validate_payload(msg.message_type, &msg.payload).is_ok());
    }

    #[test]
    fn test_descriptor_capability_names_stay_unique() {
        let desc = AgentDescriptor::new("a1", "Echo", "echoes", "1.0")
            .with_capability(Capability::new("echo", "first"))
            .with_capability(Capability::new("echo", "second"));
        assert_eq!(desc.capabilities.len(), 1);
        assert_eq!(desc.capabilities[0].description, "second");
    }

    #[test]
    fn test_descriptor_with_repeated_capability_is_rejected() {
        let text = r#"{
            "agent_id": "dup",
            "name": "Dup",
            "capabilities": [
                {"name": "echo", "description": "first"},
                {"name": "echo", "description": "second"}
            ]
        }"#;
        let err = serde_json::from_str::<AgentDescriptor>(text).unwrap_err();
        assert!(err.to_string().contains("Duplicate capability 'echo'"));
    }

    #[test]
    fn test_descriptor_defaults_on_deserialization() {
        let desc: AgentDescriptor = serde_json::from_str(
            r#"{"name": "Scorer", "capabilities": [{"name": "score", "description": ""}]}"#,
        )
        .unwrap();
        assert!(!desc.agent_id.is_empty());
        assert_eq!(desc.status, AgentStatus::Active);
        assert!(desc.has_capability("score"));

        let back: AgentDescriptor =
            serde_json::from_value(serde_json::to_value(&desc).unwrap()).unwrap();
        assert_eq!(back, desc);
    }

    #[test]
    fn test_dedup_capabilities_keeps_first_position_last_definition() {
        let mut desc = AgentDescriptor::new("a1", "Multi", "", "1.0");
        desc.capabilities = vec![
            Capability::new("echo", "first"),
            Capability::new("score", "score"),
            Capability::new("echo", "second"),
        ];
        assert_eq!(desc.dedup_capabilities(), 1);
        let names: Vec<&str> = desc.capabilities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["echo", "score"]);
        assert_eq!(desc.capabilities[0].description, "second");
    }

    #[test]
    fn test_capability_lookup_is_case_sensitive() {
        let desc = AgentDescriptor::new("a1", "Echo", "", "1.0")
            .with_capability(Capability::new("echo", ""));
        assert!(desc.has_capability("echo"));
        assert!(!desc.has_capability("Echo"));
        assert!(!desc.has_capability("ech"));
    }

    #[test]
    fn test_agent_status_parse() {
        assert_eq!("active".parse::<AgentStatus>().unwrap(), AgentStatus::Active);
        assert_eq!(
            "inactive".parse::<AgentStatus>().unwrap(),
            AgentStatus::Inactive
        );
        assert!("ACTIVE".parse::<AgentStatus>().is_err());
    }
}
