//! Core functionality for the relay: sessions, channels and routing

pub mod channel;
pub mod connection;
pub mod flood_guard;
pub mod message_types;
pub mod ping;
pub mod relay;
pub mod router;
pub mod session;

// Re-export main components for convenience
pub use channel::{Channel, ChannelDirectory};
pub use connection::{Connection, ConnectionId};
pub use flood_guard::FloodGuard;
pub use message_types::{ClientMessage, ServerMessage};
pub use ping::PingScheduler;
pub use relay::{FrameDisposition, Relay, RelayCounters, SharedRelay};
pub use router::MessageRouter;
pub use session::{Membership, Session, SessionManager};
