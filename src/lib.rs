//! Rusty Relay - A real-time channel relay over WebSocket
//!
//! Clients join a named channel, exchange short messages broadcast to the
//! other members, query presence and receive periodic latency pings.

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;
pub mod metrics;

// Re-export main components
pub use config::*;
pub use constants::*;
