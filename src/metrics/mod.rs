//! Aggregate relay statistics and their periodic reporter
//!
//! The reporter is a pure observer: it samples the relay's counters on a
//! timer and writes them to the log, never mutating relay state.

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::relay::SharedRelay;

/// Point-in-time snapshot of the relay counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStats {
    pub connections: usize,
    pub exceptions: u64,
    pub blocked: u64,
    pub channels: usize,
}

impl std::fmt::Display for RelayStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Connections: {}, Exceptions: {}, Blocked: {}, Channels: {}",
            self.connections, self.exceptions, self.blocked, self.channels
        )
    }
}

/// Logs a `RelayStats` line on a fixed period
pub struct StatsReporter;

impl StatsReporter {
    pub fn spawn(relay: SharedRelay, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match relay.stats() {
                    Ok(stats) => info!("{}", stats),
                    Err(e) => error!("Failed to sample relay stats: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_line_format() {
        let stats = RelayStats {
            connections: 3,
            exceptions: 1,
            blocked: 2,
            channels: 1,
        };
        assert_eq!(
            stats.to_string(),
            "Connections: 3, Exceptions: 1, Blocked: 2, Channels: 1"
        );
    }

    #[test]
    fn test_stats_serialize() {
        let stats = RelayStats {
            connections: 1,
            exceptions: 0,
            blocked: 0,
            channels: 1,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["connections"], 1);
        assert_eq!(json["channels"], 1);
    }
}
