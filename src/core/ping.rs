//! Periodic heartbeat pings for latency measurement

use log::{error, trace};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::relay::SharedRelay;

/// Emits a ping to every joined session on a fixed period
pub struct PingScheduler;

impl PingScheduler {
    /// Start the ping loop; the first round fires one period after start
    pub fn spawn(relay: SharedRelay, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match relay.ping_round() {
                    Ok(sent) => trace!("Ping round queued {} pings", sent),
                    Err(e) => error!("Ping round failed: {}", e),
                }
            }
        })
    }
}
