//! Relay broker that owns every piece of shared state
//!
//! Sessions, the channel directory and the aggregate counters live behind a
//! single mutex, so every connection event, frame and timer tick is applied
//! strictly one at a time. No lock is ever held across an `.await`.

use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use warp::ws::Message as WsMessage;

use crate::config::RelayLimits;
use crate::core::channel::ChannelDirectory;
use crate::core::connection::ConnectionId;
use crate::core::message_types::ServerMessage;
use crate::core::router::MessageRouter;
use crate::core::session::SessionManager;
use crate::error::{CloseEffect, RelayError, Result};
use crate::metrics::RelayStats;

/// Process-wide counters sampled by the stats reporter
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayCounters {
    /// Currently open connections
    pub connections: usize,
    /// Frames that failed with a malformed payload or internal fault
    pub exceptions: u64,
    /// Connections closed for flooding or oversized frames
    pub blocked: u64,
}

impl RelayCounters {
    fn record(&mut self, effect: CloseEffect) {
        match effect {
            CloseEffect::Plain => {}
            CloseEffect::Blocked => self.blocked += 1,
            CloseEffect::Exception => self.exceptions += 1,
        }
    }
}

/// Everything guarded by the relay lock
#[derive(Default)]
pub struct RelayState {
    pub(crate) sessions: SessionManager,
    pub(crate) channels: ChannelDirectory,
    pub(crate) counters: RelayCounters,
}

/// What the transport should do after a frame was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    Keep,
    Close,
}

/// The relay broker: construct once at startup and share by reference
pub struct Relay {
    state: Mutex<RelayState>,
    router: MessageRouter,
}

/// Thread-safe relay handle
pub type SharedRelay = Arc<Relay>;

/// Wall-clock milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

impl Relay {
    pub fn new(limits: RelayLimits) -> Self {
        Self {
            state: Mutex::new(RelayState::default()),
            router: MessageRouter::new(limits),
        }
    }

    /// Create a relay wrapped for sharing across tasks
    pub fn shared(limits: RelayLimits) -> SharedRelay {
        Arc::new(Self::new(limits))
    }

    pub fn limits(&self) -> &RelayLimits {
        self.router.limits()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, RelayState>> {
        Ok(self.state.lock()?)
    }

    /// Connection opened: allocate a fresh session
    pub fn open(&self, sender: mpsc::UnboundedSender<WsMessage>) -> Result<ConnectionId> {
        let mut state = self.lock_state()?;
        let id = state.sessions.register(sender);
        state.counters.connections += 1;

        info!("Client connected. Total connections: {}", state.counters.connections);
        Ok(id)
    }

    /// Connection closed for any reason: leave the channel and drop the session
    pub fn close(&self, id: &str) -> Result<()> {
        let mut state = self.lock_state()?;
        let entry = state
            .sessions
            .unregister(id)
            .ok_or_else(|| RelayError::SessionNotFound(id.to_string()))?;

        state.channels.leave(entry.session.channel_name(), id);
        state.counters.connections = state.counters.connections.saturating_sub(1);

        info!(
            "{} has disconnected from channel: {}",
            entry.session.identity(),
            entry.session.channel_name()
        );
        debug!(
            "Client {} was connected for {}s; current connections: {}",
            id,
            (Utc::now() - entry.connection.connected_at).num_seconds(),
            state.counters.connections
        );
        Ok(())
    }

    /// Handle one inbound frame using the current wall clock
    pub fn handle_frame(&self, id: &str, frame: &[u8]) -> FrameDisposition {
        self.handle_frame_at(id, frame, now_millis())
    }

    /// Handle one inbound frame received at `now_ms`.
    ///
    /// This is the single place where a rejected frame is turned into its
    /// counter side effect and a close request.
    pub fn handle_frame_at(&self, id: &str, frame: &[u8], now_ms: u64) -> FrameDisposition {
        let mut state = match self.lock_state() {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to acquire relay lock for frame from {}: {}", id, e);
                return FrameDisposition::Close;
            }
        };

        let err = match self.router.route(&mut state, id, frame, now_ms) {
            Ok(()) => return FrameDisposition::Keep,
            Err(err) => err,
        };

        let effect = err.close_effect();
        state.counters.record(effect);
        match effect {
            CloseEffect::Plain => warn!("Closing client {}: {}", id, err),
            CloseEffect::Blocked => warn!("Blocked client {}: {}", id, err),
            CloseEffect::Exception => error!("Error handling frame from {}: {}", id, err),
        }

        FrameDisposition::Close
    }

    /// Run one heartbeat round using the current wall clock
    pub fn ping_round(&self) -> Result<usize> {
        self.ping_round_at(now_millis())
    }

    /// Ping every joined session, reporting the previous round's latency.
    /// Returns the number of pings queued.
    pub fn ping_round_at(&self, now_ms: u64) -> Result<usize> {
        let mut state = self.lock_state()?;
        let RelayState {
            sessions, channels, ..
        } = &mut *state;

        let mut sent = 0;
        for (_, channel) in channels.iter() {
            for id in channel.members() {
                let Some(entry) = sessions.get_mut(id) else {
                    continue;
                };
                let latency = entry.session.mark_ping_sent(now_ms);
                let ping = ServerMessage::Ping { ping: latency }.to_ws_message()?;
                if entry.connection.send(ping) {
                    sent += 1;
                }
            }
        }

        Ok(sent)
    }

    /// Snapshot of the aggregate counters
    pub fn stats(&self) -> Result<RelayStats> {
        let state = self.lock_state()?;
        Ok(RelayStats {
            connections: state.counters.connections,
            exceptions: state.counters.exceptions,
            blocked: state.counters.blocked,
            channels: state.channels.channel_count(),
        })
    }

    /// Identities of a channel's members in join order
    pub fn channel_members(&self, channel: &str) -> Result<Vec<String>> {
        let state = self.lock_state()?;
        Ok(state
            .channels
            .members_of(channel)
            .iter()
            .filter_map(|id| state.sessions.get(id))
            .map(|entry| entry.session.identity().to_string())
            .collect())
    }

    /// Current outgoing message id of a session
    pub fn outgoing_message_id(&self, id: &str) -> Result<u64> {
        let state = self.lock_state()?;
        Ok(state.sessions.session(id)?.outgoing_message_id())
    }

    /// Most recent measured round-trip time of a session
    pub fn last_ping_latency_ms(&self, id: &str) -> Result<u64> {
        let state = self.lock_state()?;
        Ok(state.sessions.session(id)?.last_ping_latency_ms())
    }
}
