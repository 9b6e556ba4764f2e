//! Integration tests for Onsa
//!
//! These tests drive onsa-core through its public API only:
//! - registry + health monitor lifecycle
//! - dispatcher routing and metrics accounting
//! - protocol envelopes as a WebSocket client would see them

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use onsa_core::{
    Agent, AgentDescriptor, AgentError, AgentRegistry, Capability, EchoAgent, Error,
    HealthStatus, MessageType, Parameters, ProtocolMessage, RegistryConfig, TaskDispatcher,
    TaskRequest, TaskResponse, TaskStatus,
};
use serde_json::{json, Value};

/// Lead scorer whose probe can be flipped at runtime.
struct LeadScorer {
    healthy: AtomicBool,
    invocations: AtomicUsize,
}

impl LeadScorer {
    fn new(healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            healthy: AtomicBool::new(healthy),
            invocations: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Agent for LeadScorer {
    async fn invoke(&self, _: &str, parameters: Parameters) -> Result<Value, AgentError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let company = parameters
            .get("company")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::InvalidParameters("company is required".into()))?;
        Ok(json!({ "company": company, "score": 87 }))
    }

    async fn health_check(&self) -> Result<bool, AgentError> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }
}

fn scorer_descriptor(id: &str) -> AgentDescriptor {
    AgentDescriptor::new(id, format!("Scorer {}", id), "Scores leads", "1.0.0")
        .with_capability(Capability::new("score_lead", "Score a sales lead"))
}

fn params(value: Value) -> Parameters {
    match value {
        Value::Object(map) => map,
        _ => Parameters::new(),
    }
}

// ============================================================================
// Routing Around Unhealthy Agents
// ============================================================================

#[tokio::test]
async fn test_dispatch_skips_agent_marked_unhealthy_by_probes() {
    let registry = Arc::new(AgentRegistry::with_config(
        RegistryConfig::default().with_unhealthy_threshold(2),
    ));
    let first = LeadScorer::new(false);
    let second = LeadScorer::new(true);
    registry
        .register(scorer_descriptor("scorer-1"), Some(first.clone()))
        .await;
    registry
        .register(scorer_descriptor("scorer-2"), Some(second.clone()))
        .await;

    // One failed probe is not enough
    registry.run_health_checks().await;
    assert_eq!(
        registry.agent_health("scorer-1").await.unwrap().status,
        HealthStatus::Healthy
    );

    registry.run_health_checks().await;
    assert_eq!(
        registry.agent_health("scorer-1").await.unwrap().status,
        HealthStatus::Unhealthy
    );

    let dispatcher = TaskDispatcher::new(registry.clone());
    let outcome = dispatcher
        .dispatch(TaskRequest::new(
            "score_lead",
            params(json!({ "company": "Acme" })),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.agent.id, "scorer-2");
    assert_eq!(outcome.task.status, TaskStatus::Completed);
    assert_eq!(outcome.task.result.unwrap()["score"], 87);
    assert_eq!(first.invocations.load(Ordering::SeqCst), 0);

    let stats = registry.stats().await;
    assert_eq!(stats.total_agents, 2);
    assert_eq!(stats.healthy_agents, 1);
    assert_eq!(stats.unhealthy_agents, 1);
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.total_successes, 1);
    assert!((stats.success_rate - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_recovered_agent_is_selected_again() {
    let registry = Arc::new(AgentRegistry::with_config(
        RegistryConfig::default().with_unhealthy_threshold(1),
    ));
    let scorer = LeadScorer::new(false);
    registry
        .register(scorer_descriptor("scorer-1"), Some(scorer.clone()))
        .await;
    let dispatcher = TaskDispatcher::new(registry.clone());

    registry.run_health_checks().await;
    let err = dispatcher
        .dispatch(TaskRequest::new("score_lead", params(json!({ "company": "Acme" }))))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoHealthyAgent(_)));

    scorer.healthy.store(true, Ordering::SeqCst);
    registry.run_health_checks().await;

    let outcome = dispatcher
        .dispatch(TaskRequest::new("score_lead", params(json!({ "company": "Acme" }))))
        .await
        .unwrap();
    assert_eq!(outcome.agent.id, "scorer-1");
    assert_eq!(
        registry.agent_health("scorer-1").await.unwrap().consecutive_failures,
        0
    );
}

#[tokio::test]
async fn test_invalid_parameters_become_failed_task() {
    let registry = Arc::new(AgentRegistry::new());
    registry
        .register(scorer_descriptor("scorer-1"), Some(LeadScorer::new(true)))
        .await;
    let dispatcher = TaskDispatcher::new(registry.clone());

    let outcome = dispatcher
        .dispatch(TaskRequest::new("score_lead", Parameters::new()))
        .await
        .unwrap();

    assert_eq!(outcome.task.status, TaskStatus::Failed);
    assert!(outcome.task.error.unwrap().contains("company is required"));

    let metrics = registry.agent_metrics("scorer-1").await.unwrap();
    assert_eq!(metrics.requests, 1);
    assert_eq!(metrics.failures, 1);
}

// ============================================================================
// Monitor Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_monitor_marks_agent_unhealthy_over_time() {
    let registry = Arc::new(AgentRegistry::with_config(
        RegistryConfig::default()
            .with_interval(Duration::from_secs(10))
            .with_unhealthy_threshold(3),
    ));
    registry
        .register(scorer_descriptor("scorer-1"), Some(LeadScorer::new(false)))
        .await;

    registry.start().await;
    assert!(registry.is_running().await);

    // Cycles at t=10, 20 and 30
    tokio::time::sleep(Duration::from_secs(35)).await;
    let health = registry.agent_health("scorer-1").await.unwrap();
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert_eq!(health.consecutive_failures, 3);

    registry.stop().await;
    assert!(!registry.is_running().await);

    // Stopped monitor no longer probes
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(
        registry.agent_health("scorer-1").await.unwrap().consecutive_failures,
        3
    );
}

#[tokio::test]
async fn test_unregistered_agent_leaves_no_trace() {
    let registry = Arc::new(AgentRegistry::new());
    registry
        .register(EchoAgent::descriptor("echo"), Some(Arc::new(EchoAgent)))
        .await;
    let dispatcher = TaskDispatcher::new(registry.clone());
    dispatcher
        .dispatch(TaskRequest::new(EchoAgent::CAPABILITY, params(json!({ "v": 1 }))))
        .await
        .unwrap();

    assert!(registry.unregister("echo").await);

    assert!(registry.lookup("echo").await.is_none());
    assert!(registry.agent_health("echo").await.is_none());
    assert!(registry.agent_metrics("echo").await.is_none());
    assert!(registry.find_by_capability(EchoAgent::CAPABILITY).await.is_empty());
    assert_eq!(registry.stats().await.total_requests, 0);
}

// ============================================================================
// Protocol Envelopes
// ============================================================================

#[test]
fn test_execute_task_frame_roundtrip_through_request() {
    let frame = json!({
        "message_id": "m-1",
        "sender_id": "crm-client",
        "message_type": "execute_task",
        "payload": {
            "capability_name": "score_lead",
            "parameters": { "company": "Acme" }
        }
    });

    let message = ProtocolMessage::from_json(&frame.to_string()).unwrap();
    assert_eq!(message.message_type, MessageType::ExecuteTask);

    let request = TaskRequest::from_payload(&message.payload).unwrap();
    assert_eq!(request.capability_name, "score_lead");
    assert_eq!(request.parameters["company"], "Acme");
    assert!(!request.task_id.is_empty());
}

#[test]
fn test_response_frame_is_correlated() {
    let response = TaskResponse::completed("t-1", json!({ "ok": true }), chrono::Utc::now());
    let frame = ProtocolMessage::task_response("onsa", &response)
        .correlated_with("m-1")
        .to("crm-client");

    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(value["message_type"], "task_response");
    assert_eq!(value["correlation_id"], "m-1");
    assert_eq!(value["recipient_id"], "crm-client");
    assert_eq!(value["payload"]["status"], "completed");
}
