use std::error::Error;
use std::fmt;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum RelayError {
    // Frame rejections
    ProtocolViolation(String),
    FloodLimit,
    OversizedFrame(usize),
    MalformedPayload(String),
    InternalFault(String),

    // Session errors
    SessionNotFound(String),
    StateLock(String),

    // Configuration errors
    ConfigError(String),
}

/// Side effect applied when a rejected frame closes its connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseEffect {
    /// Close only; the connection counter drops on cleanup
    Plain,
    /// Close and bump the blocked counter
    Blocked,
    /// Close and bump the exception counter
    Exception,
}

impl RelayError {
    /// Classify how this error affects the aggregate counters
    pub fn close_effect(&self) -> CloseEffect {
        match self {
            Self::ProtocolViolation(_) => CloseEffect::Plain,
            Self::FloodLimit | Self::OversizedFrame(_) => CloseEffect::Blocked,
            Self::MalformedPayload(_)
            | Self::InternalFault(_)
            | Self::SessionNotFound(_)
            | Self::StateLock(_)
            | Self::ConfigError(_) => CloseEffect::Exception,
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolViolation(msg) => write!(f, "Protocol violation: {}", msg),
            Self::FloodLimit => write!(f, "Message rate limit exceeded"),
            Self::OversizedFrame(size) => write!(f, "Frame too large: {} bytes", size),
            Self::MalformedPayload(msg) => write!(f, "Malformed payload: {}", msg),
            Self::InternalFault(msg) => write!(f, "Internal fault: {}", msg),
            Self::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            Self::StateLock(msg) => write!(f, "Relay state lock error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for RelayError {}

// Converting from PoisonError to facilitate poisoned mutex handling
impl<T> From<PoisonError<T>> for RelayError {
    fn from(err: PoisonError<T>) -> Self {
        RelayError::StateLock(format!("Mutex poisoned: {}", err))
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::MalformedPayload(err.to_string())
    }
}

// Generic result type for the relay
pub type Result<T> = std::result::Result<T, RelayError>;
