use std::collections::HashMap;
use tokio::sync::mpsc;
use warp::ws::Message as WsMessage;

use crate::core::connection::{Connection, ConnectionId};
use crate::core::flood_guard::FloodGuard;
use crate::error::{RelayError, Result};

/// Identity and channel, assigned together by `init` and never changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub identity: String,
    pub channel: String,
}

/// Server-side state of one live connection
#[derive(Debug, Default)]
pub struct Session {
    membership: Option<Membership>,
    outgoing_message_id: u64,
    pub flood_guard: FloodGuard,
    last_ping_latency_ms: u64,
    last_ping_sent_at_ms: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_joined(&self) -> bool {
        self.membership.is_some()
    }

    /// Display name, empty until joined
    pub fn identity(&self) -> &str {
        self.membership.as_ref().map(|m| m.identity.as_str()).unwrap_or("")
    }

    /// Channel name, empty until joined
    pub fn channel_name(&self) -> &str {
        self.membership.as_ref().map(|m| m.channel.as_str()).unwrap_or("")
    }

    /// Transition from unjoined to joined; a second call is a protocol violation.
    /// The flood window restarts so the `init` itself is not charged to it.
    pub fn join(&mut self, identity: String, channel: String, now_ms: u64) -> Result<()> {
        if self.membership.is_some() {
            return Err(RelayError::ProtocolViolation("repeated init".to_string()));
        }
        self.membership = Some(Membership { identity, channel });
        self.last_ping_sent_at_ms = now_ms;
        self.flood_guard.reset();
        Ok(())
    }

    pub fn outgoing_message_id(&self) -> u64 {
        self.outgoing_message_id
    }

    /// Advance the outgoing id for a broadcast and return it
    pub fn next_message_id(&mut self) -> u64 {
        self.outgoing_message_id += 1;
        self.outgoing_message_id
    }

    /// Record a ping reply from the client
    pub fn record_ping_reply(&mut self, now_ms: u64) {
        self.last_ping_latency_ms = now_ms.saturating_sub(self.last_ping_sent_at_ms);
    }

    /// Start a new ping round, returning the previous round's latency
    pub fn mark_ping_sent(&mut self, now_ms: u64) -> u64 {
        self.last_ping_sent_at_ms = now_ms;
        self.last_ping_latency_ms
    }

    pub fn last_ping_latency_ms(&self) -> u64 {
        self.last_ping_latency_ms
    }

    pub fn last_ping_sent_at_ms(&self) -> u64 {
        self.last_ping_sent_at_ms
    }
}

/// A registered connection together with its session state
pub struct SessionEntry {
    pub connection: Connection,
    pub session: Session,
}

// Owns every live session, keyed by connection id
#[derive(Default)]
pub struct SessionManager {
    entries: HashMap<ConnectionId, SessionEntry>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    // Register a new client connection with a fresh session
    pub fn register(&mut self, sender: mpsc::UnboundedSender<WsMessage>) -> ConnectionId {
        let connection = Connection::new(sender);
        let id = connection.id.clone();
        self.entries.insert(
            id.clone(),
            SessionEntry {
                connection,
                session: Session::new(),
            },
        );
        id
    }

    // Remove a client connection, handing back its last state
    pub fn unregister(&mut self, id: &str) -> Option<SessionEntry> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&SessionEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SessionEntry> {
        self.entries.get_mut(id)
    }

    pub fn session(&self, id: &str) -> Result<&Session> {
        self.entries
            .get(id)
            .map(|entry| &entry.session)
            .ok_or_else(|| RelayError::SessionNotFound(id.to_string()))
    }

    pub fn session_mut(&mut self, id: &str) -> Result<&mut Session> {
        self.entries
            .get_mut(id)
            .map(|entry| &mut entry.session)
            .ok_or_else(|| RelayError::SessionNotFound(id.to_string()))
    }

    /// Queue a message for one client
    pub fn send_to(&self, id: &str, message: WsMessage) -> bool {
        match self.entries.get(id) {
            Some(entry) => entry.connection.send(message),
            None => false,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unjoined() {
        let session = Session::new();
        assert!(!session.is_joined());
        assert_eq!(session.identity(), "");
        assert_eq!(session.channel_name(), "");
        assert_eq!(session.outgoing_message_id(), 0);
    }

    #[test]
    fn test_join_sets_identity_and_channel_once() {
        let mut session = Session::new();
        session.join("alice".into(), "general".into(), 1_000).unwrap();
        assert_eq!(session.identity(), "alice");
        assert_eq!(session.channel_name(), "general");
        assert_eq!(session.last_ping_sent_at_ms(), 1_000);

        let err = session.join("mallory".into(), "other".into(), 2_000).unwrap_err();
        assert!(matches!(err, RelayError::ProtocolViolation(_)));
        assert_eq!(session.identity(), "alice");
        assert_eq!(session.channel_name(), "general");
    }

    #[test]
    fn test_join_restarts_flood_window() {
        let mut session = Session::new();
        session.flood_guard.check(5_000, 100).unwrap();
        assert_eq!(session.flood_guard.count(), 1);

        session.join("alice".into(), "general".into(), 5_000).unwrap();
        assert_eq!(session.flood_guard.count(), 0);
    }

    #[test]
    fn test_ping_round_reports_previous_latency() {
        let mut session = Session::new();
        session.join("alice".into(), "general".into(), 0).unwrap();

        assert_eq!(session.mark_ping_sent(1_000), 0);
        session.record_ping_reply(1_042);
        assert_eq!(session.last_ping_latency_ms(), 42);

        assert_eq!(session.mark_ping_sent(2_000), 42);
    }

    #[test]
    fn test_message_ids_increase_by_one() {
        let mut session = Session::new();
        assert_eq!(session.next_message_id(), 1);
        assert_eq!(session.next_message_id(), 2);
        assert_eq!(session.outgoing_message_id(), 2);
    }

    #[test]
    fn test_registry_register_and_unregister() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut manager = SessionManager::new();
        let id = manager.register(tx);
        assert!(manager.get(&id).is_some());

        let entry = manager.unregister(&id).unwrap();
        assert!(!entry.session.is_joined());
        assert!(manager.get(&id).is_none());
        assert!(manager.session_mut(&id).is_err());
    }
}
