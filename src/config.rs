//! Server configuration module
//! Handles runtime configuration parameters for the relay server

use crate::constants::{
    DEFAULT_HOST, DEFAULT_PING_INTERVAL_MS, DEFAULT_PORT, DEFAULT_STATS_INTERVAL_SECS,
    MAX_FRAME_BYTES, MAX_MESSAGES_PER_WINDOW, MAX_TOPIC_LENGTH,
};
use crate::error::{RelayError, Result};
use std::env;
use std::time::Duration;

/// Limits enforced by the relay core on every inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayLimits {
    /// Largest accepted raw frame, in bytes
    pub max_frame_bytes: usize,
    /// Messages a session may send within one flood window
    pub max_messages_per_window: u32,
    /// Longest accepted topic, in characters
    pub max_topic_length: usize,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            max_frame_bytes: MAX_FRAME_BYTES,
            max_messages_per_window: MAX_MESSAGES_PER_WINDOW,
            max_topic_length: MAX_TOPIC_LENGTH,
        }
    }
}

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Transport-level frame ceiling, also enforced inside the core
    pub max_payload: usize,
    /// Period of the heartbeat ping round
    pub ping_interval: Duration,
    /// Period of the stats log line; `None` disables the reporter
    pub stats_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_payload: MAX_FRAME_BYTES,
            ping_interval: Duration::from_millis(DEFAULT_PING_INTERVAL_MS),
            stats_interval: Some(Duration::from_secs(DEFAULT_STATS_INTERVAL_SECS)),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("RUSTY_RELAY_HOST").unwrap_or(DEFAULT_HOST.to_string());

        let port = env::var("RUSTY_RELAY_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let max_payload = env::var("RUSTY_RELAY_MAX_PAYLOAD")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(MAX_FRAME_BYTES);

        let ping_ms = env::var("RUSTY_RELAY_PING_INTERVAL_MS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PING_INTERVAL_MS);

        let stats_secs = env::var("RUSTY_RELAY_STATS_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_STATS_INTERVAL_SECS);

        let config = Self {
            host,
            port,
            max_payload,
            ping_interval: Duration::from_millis(ping_ms),
            stats_interval: (stats_secs > 0).then(|| Duration::from_secs(stats_secs)),
        };
        config.validate()?;

        Ok(config)
    }

    /// Reject values the relay cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_payload == 0 {
            return Err(RelayError::ConfigError(
                "RUSTY_RELAY_MAX_PAYLOAD must be greater than zero".to_string(),
            ));
        }
        if self.ping_interval.is_zero() {
            return Err(RelayError::ConfigError(
                "RUSTY_RELAY_PING_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Core limits matching this configuration
    pub fn limits(&self) -> RelayLimits {
        RelayLimits {
            max_frame_bytes: self.max_payload,
            ..RelayLimits::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_protocol_constants() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_payload, 65536);
        assert_eq!(config.ping_interval, Duration::from_millis(1000));
        assert_eq!(config.limits(), RelayLimits::default());
    }

    #[test]
    fn test_validate_rejects_zero_ping_interval() {
        let config = ServerConfig {
            ping_interval: Duration::ZERO,
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PING_INTERVAL"));
    }

    #[test]
    fn test_validate_rejects_zero_payload() {
        let config = ServerConfig {
            max_payload: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(RelayError::ConfigError(_))));
    }

    #[test]
    fn test_limits_follow_payload_ceiling() {
        let config = ServerConfig {
            max_payload: 1024,
            ..ServerConfig::default()
        };
        assert_eq!(config.limits().max_frame_bytes, 1024);
        assert_eq!(config.limits().max_topic_length, 30);
    }
}
