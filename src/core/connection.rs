//! Outbound side of a WebSocket connection
//! The transport drains the queue behind `sender` into the socket

use chrono::{DateTime, Utc};
use log::warn;
use tokio::sync::mpsc;
use uuid::Uuid;
use warp::ws::Message;

/// Identifier assigned to every accepted connection
pub type ConnectionId = String;

/// Represents the outbound queue of a single WebSocket connection
pub struct Connection {
    pub id: ConnectionId,
    pub sender: mpsc::UnboundedSender<Message>,
    pub connected_at: DateTime<Utc>,
}

impl Connection {
    /// Create a new connection with a unique ID
    pub fn new(sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            connected_at: Utc::now(),
        }
    }

    /// Queue a prepared message; failures are logged and otherwise ignored
    pub fn send(&self, message: Message) -> bool {
        match self.sender.send(message) {
            Ok(_) => true,
            Err(_) => {
                warn!("Failed to send message to client {}", self.id);
                false
            }
        }
    }
}
