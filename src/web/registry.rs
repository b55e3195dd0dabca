//! Connected sockets and best-effort fan-out to them.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

pub type ClientId = Uuid;

/// Outbound queue of one connection, drained by its writer task.
pub type Outbox = UnboundedReceiver<String>;

/// Set of connected sockets, keyed by a per-connection id.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<ClientId, UnboundedSender<String>>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection and hand back its id and outbound queue.
    pub async fn register(&self) -> (ClientId, Outbox) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.write().await.insert(id, tx);
        (id, rx)
    }

    /// Drop a connection. Its outbound queue closes once drained.
    pub async fn remove(&self, id: ClientId) -> bool {
        self.clients.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Queue `payload` for a single connection.
    pub async fn send_to(&self, id: ClientId, payload: String) -> bool {
        match self.clients.read().await.get(&id) {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    /// Queue `payload` for every connection except `exclude`. Connections
    /// whose writer has gone away are skipped. Returns how many were reached.
    pub async fn broadcast(&self, payload: &str, exclude: Option<ClientId>) -> usize {
        let clients = self.clients.read().await;
        let mut delivered = 0;
        for (id, tx) in clients.iter().filter(|(id, _)| Some(**id) != exclude) {
            if tx.send(payload.to_string()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!("Skipping broadcast to closed client {}", id);
            }
        }
        delivered
    }
}
