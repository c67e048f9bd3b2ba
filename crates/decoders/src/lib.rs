//! # Decoders
//!
//! Wire-format decoders for the modem session.
//!
//! - [`hex`]: ASCII hex text (as printed by the modem) to octets
//! - [`pdu`]: GSM 03.40 SMS PDUs (SMS-DELIVER and SMS-SUBMIT) with
//!   GSM 7-bit, 8-bit and UCS-2 user data and concatenation headers
//!
//! Everything here is pure: no I/O, no shared state.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

pub mod hex;
pub mod pdu;

pub use pdu::{decode, ConcatInfo, Encoding, MessageKind, PduEntry, PduError};
