//! Message router driving the session state machine

use log::{debug, info};
use serde_json::Value;

use crate::config::RelayLimits;
use crate::constants::LIST_TOPIC;
use crate::core::message_types::{ClientMessage, ServerMessage};
use crate::core::relay::RelayState;
use crate::error::{RelayError, Result};

/// Validates inbound frames and applies them to the relay state
#[derive(Debug, Clone)]
pub struct MessageRouter {
    limits: RelayLimits,
}

impl MessageRouter {
    pub fn new(limits: RelayLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RelayLimits {
        &self.limits
    }

    /// Process one raw frame from connection `id` received at `now_ms`.
    ///
    /// Size and rate are checked before the payload is parsed, so unjoined
    /// sessions are throttled too. The accepted `init` does not count against
    /// the joined session's window. Any `Err` means the connection must close.
    pub fn route(&self, state: &mut RelayState, id: &str, frame: &[u8], now_ms: u64) -> Result<()> {
        if frame.len() > self.limits.max_frame_bytes {
            return Err(RelayError::OversizedFrame(frame.len()));
        }

        let session = state.sessions.session_mut(id)?;
        session
            .flood_guard
            .check(now_ms, self.limits.max_messages_per_window)?;
        let joined = session.is_joined();

        let message = ClientMessage::parse(frame)?;

        match (joined, message) {
            (false, ClientMessage::Init { name, channel }) => {
                self.join(state, id, name, channel, now_ms)
            }
            (false, other) => Err(RelayError::ProtocolViolation(format!(
                "{} received before init",
                other.kind()
            ))),
            (true, ClientMessage::Ping {}) => {
                state.sessions.session_mut(id)?.record_ping_reply(now_ms);
                Ok(())
            }
            (true, ClientMessage::Message { topic, message }) => {
                let topic = self.validate_topic(topic)?;
                if topic == LIST_TOPIC {
                    self.reply_presence(state, id, topic)
                } else {
                    self.broadcast(state, id, topic, message)
                }
            }
            (true, other) => Err(RelayError::ProtocolViolation(format!(
                "unexpected {} after init",
                other.kind()
            ))),
        }
    }

    fn join(
        &self,
        state: &mut RelayState,
        id: &str,
        name: String,
        channel: String,
        now_ms: u64,
    ) -> Result<()> {
        state
            .sessions
            .session_mut(id)?
            .join(name.clone(), channel.clone(), now_ms)?;
        state.channels.join(&channel, id.to_string());

        info!("{} has joined channel: {}", name, channel);
        Ok(())
    }

    fn validate_topic(&self, topic: Option<String>) -> Result<String> {
        match topic {
            None => Err(RelayError::ProtocolViolation("missing topic".to_string())),
            Some(topic) if topic.is_empty() => {
                Err(RelayError::ProtocolViolation("empty topic".to_string()))
            }
            Some(topic) if topic.chars().count() > self.limits.max_topic_length => {
                Err(RelayError::ProtocolViolation(format!(
                    "topic longer than {} characters",
                    self.limits.max_topic_length
                )))
            }
            Some(topic) => Ok(topic),
        }
    }

    // Presence replies go to the sender only and leave the outgoing id untouched
    fn reply_presence(&self, state: &RelayState, id: &str, topic: String) -> Result<()> {
        let session = state.sessions.session(id)?;

        let names: Vec<Value> = state
            .channels
            .members_of(session.channel_name())
            .iter()
            .filter_map(|member| state.sessions.get(member))
            .map(|entry| Value::String(entry.session.identity().to_string()))
            .collect();

        let reply = ServerMessage::Message {
            id: session.outgoing_message_id() + 1,
            name: session.identity().to_string(),
            topic,
            message: Some(Value::Array(names)),
        };

        state.sessions.send_to(id, reply.to_ws_message()?);
        Ok(())
    }

    fn broadcast(
        &self,
        state: &mut RelayState,
        id: &str,
        topic: String,
        message: Option<Value>,
    ) -> Result<()> {
        let session = state.sessions.session_mut(id)?;
        let envelope = ServerMessage::Message {
            id: session.next_message_id(),
            name: session.identity().to_string(),
            topic,
            message,
        };
        let channel = session.channel_name().to_string();

        let frame = envelope.to_ws_message()?;
        let delivered = state.channels.broadcast(&channel, id, &frame, &state.sessions);
        debug!("Broadcast message to {} clients in {} from {}", delivered, channel, id);

        Ok(())
    }
}
