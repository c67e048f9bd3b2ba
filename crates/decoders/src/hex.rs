//! Hex text helpers.
//!
//! The modem prints every PDU as uppercase hex; decoding accepts either case.

use crate::pdu::PduError;

/// Parse a hex string into octets.
///
/// Fails on odd length or on any character outside `[0-9A-Fa-f]`.
/// Surrounding whitespace must already be stripped by the caller.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, PduError> {
    let digits = text.as_bytes();
    if digits.len() % 2 != 0 {
        return Err(PduError::OddLength(digits.len()));
    }

    let mut octets = Vec::with_capacity(digits.len() / 2);
    for (pair_idx, pair) in digits.chunks_exact(2).enumerate() {
        let position = pair_idx * 2;
        let (Some(&hi), Some(&lo)) = (pair.first(), pair.get(1)) else {
            return Err(PduError::OddLength(digits.len()));
        };
        let hi = nibble(hi).ok_or(PduError::InvalidHex {
            position,
            digit: hi as char,
        })?;
        let lo = nibble(lo).ok_or(PduError::InvalidHex {
            position: position + 1,
            digit: lo as char,
        })?;
        octets.push((hi << 4) | lo);
    }
    Ok(octets)
}

fn nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
