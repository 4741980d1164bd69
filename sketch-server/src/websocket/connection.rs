use sketch_types::{PlayerId, ServerEvent};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::{RwLock, mpsc};

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: PlayerId,
    pub connected_at: Instant,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Connection {
    fn new(id: PlayerId) -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            id,
            connected_at: Instant::now(),
            sender,
        };
        (connection, receiver)
    }

    pub fn send_event(&self, event: ServerEvent) -> Result<(), String> {
        self.sender
            .send(event)
            .map_err(|_| "Connection closed".to_string())
    }
}

/// Registry of live sockets. Purely a fan-out layer: who a `PlayerId`
/// belongs to, and which sets of connections an event reaches, is decided
/// by the session; this only delivers.
pub struct ConnectionManager {
    connections: RwLock<HashMap<PlayerId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, id: PlayerId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (connection, receiver) = Connection::new(id);

        let mut connections = self.connections.write().await;
        connections.insert(id, connection);

        receiver
    }

    pub async fn remove(&self, id: PlayerId) {
        let mut connections = self.connections.write().await;
        connections.remove(&id);
    }

    pub async fn send_to(&self, id: PlayerId, event: ServerEvent) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_event(event)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn broadcast(&self, event: ServerEvent) {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            let _ = connection.send_event(event.clone());
        }
    }

    pub async fn broadcast_except(&self, except: PlayerId, event: ServerEvent) {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            if connection.id != except {
                let _ = connection.send_event(event.clone());
            }
        }
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
