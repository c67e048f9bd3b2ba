//! Interpretation of `AT+CMGL` responses
//!
//! A listing is a sequence of lines:
//!
//! ```text
//! +CMGL: 1,0,,28
//! 0044048121430000521010214305000D050003070201906536FB0D02
//! +CMGL: 2,0,,27
//! 0044048121430000521010214305000C050003070202AE6F399B0C
//!
//! OK
//! ```
//!
//! Each `+CMGL:` header announces one PDU; the PDU hex follows on the next
//! line(s). Some modems wrap long PDUs, so consecutive payload lines are joined
//! until the next header or the end of input.

use crate::constants::response;
use actor_protocol::MessageFragment;
use decoders::{PduEntry, PduError};

/// Parsed `+CMGL: <index>,<stat>,[<alpha>],<length>` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmglHeader {
    /// Storage slot of the message
    pub index: u32,
    /// 0 unread, 1 read, 2 unsent, 3 sent
    pub status: u8,
    /// TPDU length in octets (excludes the SMSC block)
    pub length: usize,
}

impl CmglHeader {
    /// Parse a header line; `None` if the fields are not numeric.
    pub fn parse(line: &str) -> Option<Self> {
        let (_, fields) = line.split_once(response::LISTING_ENTRY)?;
        let fields: Vec<&str> = fields.split(',').map(str::trim).collect();
        let index = fields.first()?.parse().ok()?;
        let status = fields.get(1)?.parse().ok()?;
        let length = fields.last()?.parse().ok()?;
        Some(Self {
            index,
            status,
            length,
        })
    }
}

/// Why a listed PDU produced no fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Hex or structure could not be decoded
    Malformed(PduError),
    /// Decoded, but the data coding scheme has no supported alphabet
    NoText { dcs: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub pdu: String,
    pub reason: SkipReason,
}

/// Result of interpreting one complete listing response
#[derive(Debug, Default)]
pub struct ListingOutcome {
    /// Headers that parsed, in listing order
    pub headers: Vec<CmglHeader>,
    /// Decoded fragments, in listing order
    pub fragments: Vec<MessageFragment>,
    pub skipped: Vec<SkippedEntry>,
}

impl ListingOutcome {
    /// Number of `+CMGL:` entries that carried a PDU
    pub fn entries(&self) -> usize {
        self.fragments.len() + self.skipped.len()
    }

    fn flush(&mut self, pdu: &mut String) {
        if pdu.is_empty() {
            return;
        }
        let pdu = std::mem::take(pdu);
        match decoders::decode(&pdu) {
            Ok(entry) => match fragment_from_entry(entry) {
                Ok(fragment) => self.fragments.push(fragment),
                Err(dcs) => self.skipped.push(SkippedEntry {
                    pdu,
                    reason: SkipReason::NoText { dcs },
                }),
            },
            Err(e) => self.skipped.push(SkippedEntry {
                pdu,
                reason: SkipReason::Malformed(e),
            }),
        }
    }
}

/// Turn a decoded PDU into a storable fragment.
///
/// Returns the DCS when the entry has no text.
pub fn fragment_from_entry(entry: PduEntry) -> Result<MessageFragment, u8> {
    let Some(text) = entry.text else {
        return Err(entry.dcs);
    };
    Ok(match entry.concat {
        Some(concat) => MessageFragment::part(
            entry.address,
            concat.reference,
            concat.sequence,
            concat.total,
            text,
        ),
        None => MessageFragment::standalone(entry.address, text),
    })
}

/// Walk the lines of a listing response and decode every announced PDU.
///
/// A malformed PDU is recorded in `skipped` and does not stop the walk.
/// Empty lines and the `OK` terminator end the current payload without
/// flushing it; the flush happens at the next header or at end of input.
pub fn interpret_listing<S: AsRef<str>>(lines: &[S]) -> ListingOutcome {
    let mut outcome = ListingOutcome::default();
    let mut pdu = String::new();
    let mut next_is_pdu = false;

    for line in lines {
        let line = line.as_ref();
        if line.contains(response::LISTING_ENTRY) {
            outcome.flush(&mut pdu);
            if let Some(header) = CmglHeader::parse(line) {
                outcome.headers.push(header);
            }
            next_is_pdu = true;
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || response::is_ok(trimmed) {
            next_is_pdu = false;
        } else if next_is_pdu {
            pdu.push_str(trimmed);
        }
    }
    outcome.flush(&mut pdu);

    outcome
}
