//! SMS parts as stored by the session and whole messages after reassembly.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One decoded SMS part.
///
/// Ordered by `(group, sequence, text)`; fragments comparing equal are the
/// same fragment. `total` and `address` take no part in ordering or identity.
/// Standalone messages have `group == None`, which sorts before every
/// concatenated group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageFragment {
    /// Concatenation reference
    pub group: Option<u16>,
    /// 1-based part number
    pub sequence: Option<u8>,
    /// Number of parts announced by the sender
    pub total: Option<u8>,
    pub text: String,
    pub address: String,
}

impl MessageFragment {
    pub fn standalone(address: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            group: None,
            sequence: None,
            total: None,
            text: text.into(),
            address: address.into(),
        }
    }

    pub fn part(
        address: impl Into<String>,
        group: u16,
        sequence: u8,
        total: u8,
        text: impl Into<String>,
    ) -> Self {
        Self {
            group: Some(group),
            sequence: Some(sequence),
            total: Some(total),
            text: text.into(),
            address: address.into(),
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.group.is_none()
    }

    fn key(&self) -> (Option<u16>, Option<u8>, &str) {
        (self.group, self.sequence, self.text.as_str())
    }
}

impl PartialEq for MessageFragment {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for MessageFragment {}

impl PartialOrd for MessageFragment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageFragment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// A complete message: one standalone fragment, or every fragment of one
/// concatenation group joined in sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassembledMessage {
    pub address: String,
    pub text: String,
    /// Fragments that went into this message
    pub parts: usize,
    /// Parts announced by the sender, `None` for standalone messages
    pub expected_parts: Option<u8>,
}

impl ReassembledMessage {
    /// False when a concatenated message is missing parts
    pub fn is_complete(&self) -> bool {
        self.expected_parts
            .map_or(true, |expected| self.parts >= usize::from(expected))
    }
}
