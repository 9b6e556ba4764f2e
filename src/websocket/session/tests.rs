use super::*;
use async_trait::async_trait;
use onsa_core::{
    Agent, AgentDescriptor, AgentError, AgentRegistry, Capability, EchoAgent, Parameters,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Holds every invocation until a permit is released.
struct GatedAgent {
    gate: Semaphore,
    finished: AtomicUsize,
}

impl GatedAgent {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            finished: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Agent for GatedAgent {
    async fn invoke(&self, _: &str, parameters: Parameters) -> Result<Value, AgentError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| AgentError::Failed(e.to_string()))?;
        permit.forget();
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Object(parameters))
    }
}

struct Harness {
    session: Session,
    rx: mpsc::UnboundedReceiver<ProtocolMessage>,
    registry: Arc<AgentRegistry>,
}

async fn harness() -> Harness {
    let registry = Arc::new(AgentRegistry::new());
    registry
        .register(EchoAgent::descriptor("echo-1"), Some(Arc::new(EchoAgent)))
        .await;
    let dispatcher = Arc::new(TaskDispatcher::new(registry.clone()));
    let (tx, rx) = mpsc::unbounded_channel();
    Harness {
        session: Session::new("client-1", "a2a-server", dispatcher, tx),
        rx,
        registry,
    }
}

async fn next(rx: &mut mpsc::UnboundedReceiver<ProtocolMessage>) -> ProtocolMessage {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("channel closed")
}

fn execute_frame(message_id: &str, capability: &str, parameters: Value) -> String {
    json!({
        "message_id": message_id,
        "message_type": "execute_task",
        "sender_id": "client-1",
        "payload": {"capability_name": capability, "parameters": parameters}
    })
    .to_string()
}

#[tokio::test]
async fn test_ping_yields_one_correlated_pong() {
    let mut h = harness().await;
    h.session.handle_text(
        &json!({"message_id": "ping-1", "message_type": "ping", "sender_id": "client-1"})
            .to_string(),
    );

    let pong = next(&mut h.rx).await;
    assert_eq!(pong.message_type, MessageType::Pong);
    assert_eq!(pong.correlation_id.as_deref(), Some("ping-1"));
    assert_eq!(pong.recipient_id.as_deref(), Some("client-1"));
    assert_eq!(pong.sender_id, "a2a-server");
    assert!(pong.payload.contains_key("timestamp"));
    assert!(h.rx.try_recv().is_err());
}

#[tokio::test]
async fn test_execute_task_acks_then_responds() {
    let mut h = harness().await;
    h.session
        .handle_text(&execute_frame("m-1", "echo", json!({"v": 1})));

    let ack = next(&mut h.rx).await;
    assert_eq!(ack.message_type, MessageType::TaskStatus);
    assert_eq!(ack.payload["status"], ACCEPTED);
    assert_eq!(ack.correlation_id.as_deref(), Some("m-1"));
    let task_id = ack.payload["task_id"].clone();

    let response = next(&mut h.rx).await;
    assert_eq!(response.message_type, MessageType::TaskResponse);
    assert_eq!(response.correlation_id.as_deref(), Some("m-1"));
    assert_eq!(response.payload["task_id"], task_id);
    assert_eq!(response.payload["status"], "completed");
    assert_eq!(response.payload["result"], json!({"v": 1}));
}

#[tokio::test]
async fn test_concurrent_tasks_ack_before_any_response() {
    let mut h = harness().await;
    let gated = GatedAgent::new();
    h.registry
        .register(
            AgentDescriptor::new("slow-1", "Slow", "", "1")
                .with_capability(Capability::new("slow", "waits for a permit")),
            Some(gated.clone()),
        )
        .await;

    h.session.handle_text(&execute_frame("m-1", "slow", json!({"n": 1})));
    h.session.handle_text(&execute_frame("m-2", "slow", json!({"n": 2})));

    let first = next(&mut h.rx).await;
    let second = next(&mut h.rx).await;
    assert_eq!(first.message_type, MessageType::TaskStatus);
    assert_eq!(second.message_type, MessageType::TaskStatus);
    assert_eq!(first.correlation_id.as_deref(), Some("m-1"));
    assert_eq!(second.correlation_id.as_deref(), Some("m-2"));
    assert_eq!(h.session.in_flight(), 2);

    gated.gate.add_permits(2);

    let mut correlated = vec![
        next(&mut h.rx).await.correlation_id.unwrap(),
        next(&mut h.rx).await.correlation_id.unwrap(),
    ];
    correlated.sort();
    assert_eq!(correlated, vec!["m-1", "m-2"]);
}

#[tokio::test]
async fn test_close_detaches_running_tasks() {
    let mut h = harness().await;
    let gated = GatedAgent::new();
    h.registry
        .register(
            AgentDescriptor::new("slow-1", "Slow", "", "1")
                .with_capability(Capability::new("slow", "waits for a permit")),
            Some(gated.clone()),
        )
        .await;

    h.session.handle_text(&execute_frame("m-1", "slow", json!({})));
    let _ack = next(&mut h.rx).await;

    // let the task reach the gate before the connection goes away
    tokio::task::yield_now().await;
    assert_eq!(h.session.close(), 1);
    drop(h.rx);

    gated.gate.add_permits(1);
    for _ in 0..50 {
        if gated.finished.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(gated.finished.load(Ordering::SeqCst), 1);
    assert_eq!(h.registry.agent_metrics("slow-1").await.unwrap().successes, 1);
}

#[tokio::test]
async fn test_invalid_payload_reports_error_and_keeps_session() {
    let mut h = harness().await;
    h.session.handle_text(
        &json!({
            "message_id": "bad-1",
            "message_type": "execute_task",
            "sender_id": "client-1",
            "payload": {"parameters": {}}
        })
        .to_string(),
    );

    let error = next(&mut h.rx).await;
    assert_eq!(error.message_type, MessageType::Error);
    assert_eq!(error.payload["original_message_type"], "execute_task");
    assert_eq!(error.correlation_id.as_deref(), Some("bad-1"));
    assert!(error.payload["error"]
        .as_str()
        .unwrap()
        .contains("capability_name"));

    h.session.handle_text(
        &json!({"message_id": "ping-2", "message_type": "ping", "sender_id": "client-1"})
            .to_string(),
    );
    assert_eq!(next(&mut h.rx).await.message_type, MessageType::Pong);
}

#[tokio::test]
async fn test_unparseable_frame_has_null_original_type() {
    let mut h = harness().await;
    h.session.handle_text("not json at all");

    let error = next(&mut h.rx).await;
    assert_eq!(error.message_type, MessageType::Error);
    assert!(error.payload["original_message_type"].is_null());
    assert!(error.correlation_id.is_none());
}

#[tokio::test]
async fn test_unhandled_type_is_reported() {
    let mut h = harness().await;
    h.session.handle_text(
        &json!({"message_id": "q-1", "message_type": "query", "sender_id": "client-1"})
            .to_string(),
    );

    let error = next(&mut h.rx).await;
    assert_eq!(error.message_type, MessageType::Error);
    assert_eq!(error.payload["error"], "Unknown message type: query");
    assert_eq!(error.correlation_id.as_deref(), Some("q-1"));
}

#[tokio::test]
async fn test_dispatch_error_becomes_error_frame() {
    let mut h = harness().await;
    h.session
        .handle_text(&execute_frame("m-9", "missing", json!({})));

    let ack = next(&mut h.rx).await;
    let task_id = ack.payload["task_id"].clone();

    let error = next(&mut h.rx).await;
    assert_eq!(error.message_type, MessageType::Error);
    assert_eq!(error.correlation_id.as_deref(), Some("m-9"));
    assert_eq!(error.payload["task_id"], task_id);
    assert_eq!(
        error.payload["error"],
        "No agents found with capability 'missing'"
    );
}

#[tokio::test]
async fn test_non_utf8_binary_frame_gets_error_reply() {
    let mut h = harness().await;
    h.session.handle_binary(&[0x7b, 0xff, 0xfe, 0x7d]);

    let error = next(&mut h.rx).await;
    assert_eq!(error.message_type, MessageType::Error);
    assert!(error.payload["error"].as_str().unwrap().contains("not UTF-8"));
    assert!(error.payload["original_message_type"].is_null());
    assert_eq!(error.recipient_id.as_deref(), Some("client-1"));

    // session keeps serving
    h.session.handle_binary(
        json!({"message_id": "ping-2", "message_type": "ping", "sender_id": "client-1"})
            .to_string()
            .as_bytes(),
    );
    let pong = next(&mut h.rx).await;
    assert_eq!(pong.message_type, MessageType::Pong);
    assert_eq!(pong.correlation_id.as_deref(), Some("ping-2"));
}
