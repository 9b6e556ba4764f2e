//! Per-connection A2A session.
//!
//! The socket loop feeds every text frame into [`Session::handle_text`], which
//! never awaits: replies go out through the outbound channel and
//! `execute_task` work is spawned into the session's `JoinSet`. Completed
//! tasks push their `task_response` through the same channel.

use onsa_core::{MessageType, ProtocolMessage, TaskDispatcher, TaskRequest};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Status pushed as soon as an `execute_task` frame is accepted.
pub const ACCEPTED: &str = "accepted";

pub struct Session {
    client_id: String,
    sender_id: String,
    dispatcher: Arc<TaskDispatcher>,
    outbound: mpsc::UnboundedSender<ProtocolMessage>,
    tasks: JoinSet<()>,
}

impl Session {
    pub fn new(
        client_id: impl Into<String>,
        sender_id: impl Into<String>,
        dispatcher: Arc<TaskDispatcher>,
        outbound: mpsc::UnboundedSender<ProtocolMessage>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            sender_id: sender_id.into(),
            dispatcher,
            outbound,
            tasks: JoinSet::new(),
        }
    }

    /// Handle one inbound text frame.
    pub fn handle_text(&mut self, text: &str) {
        self.reap();

        match ProtocolMessage::from_json(text) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                let raw: Option<Value> = serde_json::from_str(text).ok();
                let field = |name: &str| {
                    raw.as_ref()
                        .and_then(|v| v.get(name))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                };
                debug!(client_id = %self.client_id, error = %e, "Rejected frame");

                let mut reply = ProtocolMessage::error(
                    &self.sender_id,
                    e.to_string(),
                    field("message_type").as_deref(),
                );
                if let Some(message_id) = field("message_id") {
                    reply = reply.correlated_with(message_id);
                }
                self.send(reply);
            }
        }
    }

    /// Handle one inbound binary frame. Only UTF-8 JSON is understood.
    pub fn handle_binary(&mut self, bytes: &[u8]) {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.handle_text(text),
            Err(e) => {
                debug!(client_id = %self.client_id, error = %e, "Rejected non-UTF-8 frame");
                self.send(ProtocolMessage::error(
                    &self.sender_id,
                    format!("Invalid frame: not UTF-8 ({})", e),
                    None,
                ));
            }
        }
    }

    fn handle_message(&mut self, message: ProtocolMessage) {
        match message.message_type {
            MessageType::Ping => {
                let pong =
                    ProtocolMessage::pong(&self.sender_id).correlated_with(message.message_id);
                self.send(pong);
            }
            MessageType::ExecuteTask => self.accept_task(message),
            other => {
                let reply = ProtocolMessage::error(
                    &self.sender_id,
                    format!("Unknown message type: {}", other),
                    Some(other.as_str()),
                )
                .correlated_with(message.message_id);
                self.send(reply);
            }
        }
    }

    fn accept_task(&mut self, message: ProtocolMessage) {
        let request = match TaskRequest::from_payload(&message.payload) {
            Ok(request) => request,
            Err(e) => {
                let reply = ProtocolMessage::error(
                    &self.sender_id,
                    e.to_string(),
                    Some(MessageType::ExecuteTask.as_str()),
                )
                .correlated_with(message.message_id);
                self.send(reply);
                return;
            }
        };

        let ack = ProtocolMessage::task_status(&self.sender_id, &request.task_id, ACCEPTED)
            .correlated_with(message.message_id.clone());
        self.send(ack);

        let dispatcher = self.dispatcher.clone();
        let outbound = self.outbound.clone();
        let sender_id = self.sender_id.clone();
        let client_id = self.client_id.clone();
        let message_id = message.message_id;

        self.tasks.spawn(async move {
            let task_id = request.task_id.clone();
            let reply = match dispatcher.dispatch(request).await {
                Ok(outcome) => ProtocolMessage::task_response(&sender_id, &outcome.task),
                Err(e) => {
                    let mut reply = ProtocolMessage::error(
                        &sender_id,
                        e.to_string(),
                        Some(MessageType::ExecuteTask.as_str()),
                    );
                    reply.payload.insert("task_id".into(), Value::String(task_id));
                    reply
                }
            };

            let reply = reply.to(client_id.as_str()).correlated_with(message_id);
            if outbound.send(reply).is_err() {
                debug!(
                    client_id = %client_id,
                    "Connection closed before task finished; result dropped"
                );
            }
        });
    }

    fn send(&self, message: ProtocolMessage) {
        let message = message.to(self.client_id.as_str());
        if self.outbound.send(message).is_err() {
            debug!(client_id = %self.client_id, "Outbound channel closed");
        }
    }

    /// Collect finished tasks so the set does not grow without bound.
    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                warn!(client_id = %self.client_id, error = %e, "WebSocket task panicked");
            }
        }
    }

    /// Tasks spawned and not yet collected.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// End the session. Outstanding tasks are detached and run to completion;
    /// returns how many were still running.
    pub fn close(mut self) -> usize {
        self.reap();
        let outstanding = self.tasks.len();
        self.tasks.detach_all();
        outstanding
    }
}

#[cfg(test)]
mod tests;
