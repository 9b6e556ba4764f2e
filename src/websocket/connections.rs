//! Active WebSocket connections, keyed by client id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One live connection.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionEntry {
    /// Distinguishes successive connections under the same client id
    pub connection_id: Uuid,
    pub connected_at: DateTime<Utc>,
}

/// Shared table of live connections (cloned into every handler).
#[derive(Debug, Clone, Default)]
pub struct ConnectionTable {
    inner: Arc<RwLock<HashMap<String, ConnectionEntry>>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection. A previous connection under the same client
    /// id is replaced.
    pub async fn insert(&self, client_id: &str) -> Uuid {
        let entry = ConnectionEntry {
            connection_id: Uuid::new_v4(),
            connected_at: Utc::now(),
        };
        let connection_id = entry.connection_id;
        self.inner.write().await.insert(client_id.to_string(), entry);
        connection_id
    }

    /// Remove the entry only if it still belongs to `connection_id`.
    pub async fn remove(&self, client_id: &str, connection_id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        match inner.get(client_id) {
            Some(entry) if entry.connection_id == connection_id => {
                inner.remove(client_id);
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub async fn get(&self, client_id: &str) -> Option<ConnectionEntry> {
        self.inner.read().await.get(client_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
