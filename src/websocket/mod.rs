//! WebSocket transport for the A2A protocol
//!
//! `GET /a2a/ws/:client_id` upgrades to a socket whose text frames are
//! protocol envelopes. Each connection gets a [`Session`].

mod connections;
mod session;

pub use connections::ConnectionTable;
pub use session::Session;

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::Path,
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use futures_util::{SinkExt, StreamExt};
use onsa_core::{ProtocolMessage, TaskDispatcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::ServerInfo;
use crate::server::config::WebSocketConfig;

pub fn ws_routes() -> Router {
    Router::new().route("/a2a/ws/:client_id", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    Extension(dispatcher): Extension<Arc<TaskDispatcher>>,
    Extension(connections): Extension<ConnectionTable>,
    Extension(info): Extension<ServerInfo>,
    Extension(settings): Extension<WebSocketConfig>,
) -> impl IntoResponse {
    ws.max_message_size(settings.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, client_id, dispatcher, connections, info))
}

async fn handle_socket(
    socket: WebSocket,
    client_id: String,
    dispatcher: Arc<TaskDispatcher>,
    connections: ConnectionTable,
    info: ServerInfo,
) {
    let connection_id = connections.insert(&client_id).await;
    info!(client_id = %client_id, "WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut outbound_rx) = mpsc::unbounded_channel::<ProtocolMessage>();
    let mut session = Session::new(client_id.as_str(), info.sender_id.as_str(), dispatcher, tx);

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => session.handle_text(&text),
                    Some(Ok(Message::Binary(bytes))) => session.handle_binary(&bytes),
                    // axum answers pings itself
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        error!(client_id = %client_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            // the session holds a sender, so this never yields None while it lives
            Some(outgoing) = outbound_rx.recv() => {
                match serde_json::to_string(&outgoing) {
                    Ok(json) => {
                        if sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to serialize outbound message"),
                }
            }
        }
    }

    connections.remove(&client_id, connection_id).await;
    let detached = session.close();
    if detached > 0 {
        debug!(client_id = %client_id, detached, "Detached in-flight tasks");
    }
    info!(client_id = %client_id, "WebSocket disconnected");
}
