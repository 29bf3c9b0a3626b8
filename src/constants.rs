// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const WS_PATH: &str = "ws";

// Protocol limits
pub const MAX_FRAME_BYTES: usize = 64 * 1024;
pub const MAX_MESSAGES_PER_WINDOW: u32 = 100;
pub const MAX_TOPIC_LENGTH: usize = 30;
pub const LIST_TOPIC: &str = "list";

// Timers
pub const DEFAULT_PING_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_STATS_INTERVAL_SECS: u64 = 5;
