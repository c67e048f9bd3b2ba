//! # Actor Protocol
//!
//! Message and state definitions shared by the modem actors.
//!
//! Nothing here performs I/O, so every type is testable in isolation.
//!
//! ## Architecture
//!
//! - **ModemCommand**: AT commands the poller sends to the modem
//! - **SessionEvent**: completion and status events from the session actor
//! - **SessionPhase**: configuring/listing state machine (pure logic)
//! - **MessageFragment / ReassembledMessage**: SMS parts and whole messages
//!
//! ## Message Flow
//!
//! ```text
//! Poller → ModemCommand → PortActor → modem
//!   ↑                                   ↓
//! SessionEvent ← SessionActor ← response chunks
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod errors;
pub mod messages;
pub mod sms;
pub mod state;

pub use errors::ActorError;
pub use messages::{MessageStatus, ModemCommand, SerialPortInfo, SessionEvent};
pub use sms::{MessageFragment, ReassembledMessage};
pub use state::SessionPhase;
