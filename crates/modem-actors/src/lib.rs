//! # Modem Actors
//!
//! Actors and helpers that poll a GSM modem for SMS.
//!
//! ## Actors
//!
//! - **SessionActor**: Interprets modem responses, owns the message store
//! - **PortActor**: Runs the read loop and writes commands
//!
//! ## Helpers
//!
//! - **ModemPoller**: Command sequence and polling loop
//! - **discovery**: Finds the port a modem is attached to
//! - **listing**: `AT+CMGL` response interpreter
//! - **MessageStore**: Duplicate-free fragment store and reassembler

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod constants;
pub mod discovery;
pub mod listing;
pub mod poller;
pub mod port_actor;
pub mod session_actor;
pub mod store;

pub use discovery::{discover, identify};
pub use listing::{interpret_listing, CmglHeader, ListingOutcome};
pub use poller::{extract_code, ModemPoller, PollReport, PollerConfig};
pub use port_actor::PortActor;
pub use session_actor::SessionActor;
pub use store::MessageStore;
