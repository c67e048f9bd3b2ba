use serde::{Deserialize, Serialize};

pub mod transport;
pub use transport::{FlowControl, ParityMode, SerialConfig, Transport, TransportError};

/// One logical unit of modem output (one response line).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    /// The raw bytes comprising this frame.
    pub bytes: Vec<u8>,
    /// Timestamp in microseconds of the first byte.
    pub timestamp_us: u64,
}

impl Frame {
    pub fn new(bytes: Vec<u8>, timestamp_us: u64) -> Self {
        Self {
            bytes,
            timestamp_us,
        }
    }

    /// Frame contents as text with the line terminator (`\n`, `\r\n`) removed.
    ///
    /// Modem responses are ASCII; anything else is replaced lossily.
    pub fn text(&self) -> String {
        let text = String::from_utf8_lossy(&self.bytes);
        text.trim_end_matches(&['\r', '\n'][..]).to_string()
    }
}
