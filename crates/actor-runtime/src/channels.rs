use actor_protocol::{ActorError, ModemCommand, ReassembledMessage, SessionEvent};
use futures_channel::{mpsc, oneshot};

/// Message types for each actor in the system
pub enum SessionMessage {
    /// Raw bytes from the port read loop
    Chunk { data: Vec<u8>, timestamp_us: u64 },

    /// The read loop hit a transport error
    ReadFailed { reason: String },

    /// Responses from now on are message listings
    EnterListing,

    /// Discard the next response (a delete command's) up to its terminal line
    SuppressNextResponse,

    /// Stop discarding; the delete response is not coming
    CancelSuppression,

    /// Reassemble and hand over every stored fragment, emptying the store
    Drain {
        reply: oneshot::Sender<Vec<ReassembledMessage>>,
    },
}

// Manual Debug implementation to keep chunk payloads out of the logs
impl std::fmt::Debug for SessionMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chunk { data, timestamp_us } => f
                .debug_struct("Chunk")
                .field("len", &data.len())
                .field("timestamp_us", timestamp_us)
                .finish(),
            Self::ReadFailed { reason } => f
                .debug_struct("ReadFailed")
                .field("reason", reason)
                .finish(),
            Self::EnterListing => write!(f, "EnterListing"),
            Self::SuppressNextResponse => write!(f, "SuppressNextResponse"),
            Self::CancelSuppression => write!(f, "CancelSuppression"),
            Self::Drain { .. } => f
                .debug_struct("Drain")
                .field("reply", &"<oneshot>")
                .finish(),
        }
    }
}

pub enum PortMessage {
    /// Write bytes; the outcome is reported on `reply` when present
    Write {
        data: Vec<u8>,
        reply: Option<oneshot::Sender<Result<(), ActorError>>>,
    },
    Close,
}

// Manual Debug implementation
impl std::fmt::Debug for PortMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write { data, reply } => f
                .debug_struct("Write")
                .field("data", &String::from_utf8_lossy(data))
                .field("reply", &reply.is_some())
                .finish(),
            Self::Close => write!(f, "Close"),
        }
    }
}

/// Handles for spawning actors
pub struct ActorHandles {
    pub session_rx: mpsc::Receiver<SessionMessage>,
    pub port_rx: mpsc::Receiver<PortMessage>,
    pub event_tx: mpsc::Sender<SessionEvent>,
}

/// Channel manager for actor communication
///
/// This manages all communication channels between actors and provides
/// a unified interface for sending messages.
pub struct ChannelManager {
    // Using bounded channels to prevent memory exhaustion under high load
    session_tx: mpsc::Sender<SessionMessage>,
    port_tx: mpsc::Sender<PortMessage>,

    // Event receiver (NOT cloned, replaced with dummy in Clone impl)
    // Note: a clone can send but never sees events
    event_rx: mpsc::Receiver<SessionEvent>,
}

impl Clone for ChannelManager {
    fn clone(&self) -> Self {
        let (_dummy_tx, dummy_rx) = mpsc::channel(1);
        Self {
            session_tx: self.session_tx.clone(),
            port_tx: self.port_tx.clone(),
            event_rx: dummy_rx, // Dummy receiver (disconnected)
        }
    }
}

fn send_error<T>(actor: &str, e: mpsc::TrySendError<T>) -> ActorError {
    if e.is_full() {
        ActorError::Other(format!(
            "{} overloaded: message queue full. The modem is producing data faster than it is processed.",
            actor
        ))
    } else {
        ActorError::ChannelClosed(format!("{} is no longer running", actor))
    }
}

impl ChannelManager {
    /// Create a new channel manager and actor handles
    ///
    /// Returns (ChannelManager for the poller, ActorHandles for spawning actors)
    ///
    /// Channel capacities:
    /// - session_tx: 512 - Read chunks plus control messages
    /// - port_tx: 64 - AT command writes (one per poll step)
    /// - event_tx: 256 - Completion and status events
    pub fn new() -> (Self, ActorHandles) {
        let (session_tx, session_rx) = mpsc::channel(512);
        let (port_tx, port_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::channel(256);

        let handles = ActorHandles {
            session_rx,
            port_rx,
            event_tx,
        };

        let manager = Self {
            session_tx,
            port_tx,
            event_rx,
        };

        (manager, handles)
    }

    /// Send an AT command and wait until the port actor has written it
    ///
    /// Write failures come back as `ActorError::Transport`.
    pub async fn send_command(&self, cmd: ModemCommand) -> Result<(), ActorError> {
        let (reply, written) = oneshot::channel();
        self.port_tx
            .clone()
            .try_send(PortMessage::Write {
                data: cmd.to_bytes(),
                reply: Some(reply),
            })
            .map_err(|e| send_error("PortActor", e))?;
        written.await.map_err(|_| {
            ActorError::ChannelClosed("PortActor dropped write acknowledgement".into())
        })?
    }

    /// Switch the session to listing mode
    pub fn enter_listing(&self) -> Result<(), ActorError> {
        self.send_session(SessionMessage::EnterListing)
    }

    /// Make the session discard the next response up to its `OK`/error line
    pub fn suppress_next_response(&self) -> Result<(), ActorError> {
        self.send_session(SessionMessage::SuppressNextResponse)
    }

    /// Give up on a suppressed response that never completed
    pub fn cancel_suppression(&self) -> Result<(), ActorError> {
        self.send_session(SessionMessage::CancelSuppression)
    }

    /// Ask the session for every reassembled message and wait for the reply
    pub async fn drain(&self) -> Result<Vec<ReassembledMessage>, ActorError> {
        let (reply, response) = oneshot::channel();
        self.send_session(SessionMessage::Drain { reply })?;
        response
            .await
            .map_err(|_| ActorError::ChannelClosed("SessionActor dropped drain reply".into()))
    }

    /// Ask the port actor to close the transport
    pub fn close_port(&self) -> Result<(), ActorError> {
        self.port_tx
            .clone()
            .try_send(PortMessage::Close)
            .map_err(|e| send_error("PortActor", e))
    }

    fn send_session(&self, msg: SessionMessage) -> Result<(), ActorError> {
        self.session_tx
            .clone()
            .try_send(msg)
            .map_err(|e| send_error("SessionActor", e))
    }

    /// Get mutable reference to event receiver
    pub fn event_receiver(&mut self) -> &mut mpsc::Receiver<SessionEvent> {
        &mut self.event_rx
    }

    /// Sender for direct actor-to-actor communication
    ///
    /// The port read loop uses this to deliver chunks to the session
    pub fn session_sender(&self) -> mpsc::Sender<SessionMessage> {
        self.session_tx.clone()
    }
}
