//! Message types exchanged over a relay connection

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use warp::ws::Message as WsMessage;

use crate::error::Result;

/// Client-to-server message types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Join a channel under a display name; scalar values are taken as text
    Init {
        #[serde(deserialize_with = "scalar_text")]
        name: String,
        #[serde(deserialize_with = "scalar_text")]
        channel: String,
    },

    /// Reply to a heartbeat
    Ping {},

    /// Broadcast to the channel, or a presence query when `topic` is "list"
    Message {
        #[serde(default)]
        topic: Option<String>,
        #[serde(
            default,
            deserialize_with = "present_value",
            skip_serializing_if = "Option::is_none"
        )]
        message: Option<Value>,
    },

    /// Any other `type`
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Decode a raw frame
    pub fn parse(frame: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(frame)?)
    }

    /// Name of the variant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Ping {} => "ping",
            Self::Message { .. } => "message",
            Self::Unknown => "unknown",
        }
    }
}

/// Server-to-client message types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Heartbeat carrying the previous round's latency in milliseconds
    Ping { ping: u64 },

    /// Channel message envelope, also used for presence replies
    Message {
        id: u64,
        name: String,
        topic: String,
        #[serde(
            default,
            deserialize_with = "present_value",
            skip_serializing_if = "Option::is_none"
        )]
        message: Option<Value>,
    },
}

impl ServerMessage {
    /// Serialize once into a text frame
    pub fn to_ws_message(&self) -> Result<WsMessage> {
        Ok(WsMessage::text(serde_json::to_string(self)?))
    }
}

// Accept strings, numbers and booleans, rendered as text
fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string, number or boolean, found {}",
            other
        ))),
    }
}

// A present field is `Some` even when it is `null`; only an absent field is `None`
fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
