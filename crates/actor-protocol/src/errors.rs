//! Error Handling Guidelines
//!
//! All error messages should follow this format:
//!
//! 1. **What failed**: Describe the operation that failed
//! 2. **Why it failed**: Provide the root cause if known
//! 3. **What to do**: Suggest user action when possible
//!
//! Examples:
//! - ✅ "No modem answered ATI on any port. Check the cable and set com_port in app.properties."
//! - ✅ "Failed to write AT+CMGL=0: port closed. Restart the poller."
//! - ❌ "No modem" (lacks context and action)
//! - ❌ "Error" (too vague)

use thiserror::Error;

/// Unified error type for actor operations
#[derive(Error, Debug, Clone)]
pub enum ActorError {
    /// Phase transition was rejected
    #[error("Invalid phase transition: {0}")]
    InvalidTransition(String),

    /// Communication channel closed
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Timeout waiting for response
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No modem answered on any candidate port
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ActorError {
    fn from(s: String) -> Self {
        ActorError::Other(s)
    }
}

impl From<&str> for ActorError {
    fn from(s: &str) -> Self {
        ActorError::Other(s.to_string())
    }
}

impl From<core_types::TransportError> for ActorError {
    fn from(e: core_types::TransportError) -> Self {
        ActorError::Transport(e.to_string())
    }
}
