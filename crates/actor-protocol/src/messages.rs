use crate::state::SessionPhase;
use serde::{Deserialize, Serialize};

/// Serial port information used during discovery
/// This is a simplified representation that can be serialized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialPortInfo {
    pub path: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    pub fn new(path: String, vid: Option<u16>, pid: Option<u16>) -> Self {
        Self { path, vid, pid }
    }
}

/// `<stat>` argument of `AT+CMGL` in PDU mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageStatus {
    ReceivedUnread,
    ReceivedRead,
    StoredUnsent,
    StoredSent,
    All,
}

impl MessageStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::ReceivedUnread => 0,
            Self::ReceivedRead => 1,
            Self::StoredUnsent => 2,
            Self::StoredSent => 3,
            Self::All => 4,
        }
    }
}

/// AT commands sent to the modem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModemCommand {
    /// `ATI`: identification, used to recognise a modem during discovery
    Identify,

    /// `AT+CMGF=0`: switch to PDU mode
    SetPduMode,

    /// `AT+CPMS="MT"`: read from SIM and phone storage combined
    SelectStorage,

    /// `AT+CMGL=<stat>`
    List(MessageStatus),

    /// `AT+CMGD=1,3`: delete every read, sent and unsent message
    DeleteProcessed,
}

impl ModemCommand {
    /// Command text without the line terminator
    pub fn at_string(&self) -> String {
        match self {
            Self::Identify => "ATI".to_string(),
            Self::SetPduMode => "AT+CMGF=0".to_string(),
            Self::SelectStorage => "AT+CPMS=\"MT\"".to_string(),
            Self::List(status) => format!("AT+CMGL={}", status.code()),
            Self::DeleteProcessed => "AT+CMGD=1,3".to_string(),
        }
    }

    /// Bytes to write to the port, terminated by `\r\n`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.at_string().into_bytes();
        bytes.extend_from_slice(b"\r\n");
        bytes
    }
}

/// Events from the session actor to the poller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SessionEvent {
    /// Session phase has changed
    PhaseChanged { phase: SessionPhase },

    /// A line carrying the `IMEI:` marker was seen (first time only)
    DeviceIdentified { line: String },

    /// A command outside a listing finished with a terminal line
    CommandAcknowledged { ok: bool, response: Vec<String> },

    /// A listing finished with `OK`; `parts` fragments were stored
    ListingComplete { parts: usize, skipped: usize },

    /// The suppressed response to a delete command arrived
    DeleteAcknowledged,

    /// Status message for the operator
    StatusUpdate { message: String },

    /// Error occurred
    Error { message: String },
}
