use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Not connected")]
    NotConnected,
    #[error("Other: {0}")]
    Other(String),
}

/// Serial line parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: ParityMode,
    pub flow_control: FlowControl,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParityMode {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlowControl {
    None,
    /// RTS/CTS in both directions
    Hardware,
    Software,
}

impl SerialConfig {
    /// Create a standard 8N1 configuration at specified baud rate
    pub fn new_8n1(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: 8,
            stop_bits: 1,
            parity: ParityMode::None,
            flow_control: FlowControl::None,
        }
    }

    /// GSM modem line settings: 9600 8N1 with RTS/CTS handshaking
    pub fn modem_default() -> Self {
        Self {
            flow_control: FlowControl::Hardware,
            ..Self::new_8n1(9600)
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::modem_default()
    }
}

/// A byte-stream transport to the modem (serial port, or a scripted fake in tests).
///
/// The futures are required to be `Send` so the read loop can run on a
/// multi-threaded executor without knowing the concrete transport.
pub trait Transport: Send + Sync {
    /// Read the next chunk of bytes.
    ///
    /// Returns (data, timestamp_us). An empty chunk means the read timed out
    /// without data and is not an error.
    fn read_chunk(&self) -> impl Future<Output = Result<(Vec<u8>, u64), TransportError>> + Send;

    /// Write bytes to the transport.
    fn write(&self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the connection. Subsequent reads fail with `NotConnected`.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}
