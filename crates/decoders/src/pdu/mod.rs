//! GSM 03.40 SMS PDU decoding.
//!
//! A PDU arrives from the modem as one hex line after a `+CMGL:` header.
//! [`decode`] turns it into a [`PduEntry`]; entries whose alphabet is not
//! supported still decode, with `text == None`.

pub mod address;
pub mod alphabet;
pub mod udh;

pub use alphabet::Encoding;
pub use udh::{ConcatInfo, InformationElement, UserDataHeader};

use crate::hex::parse_hex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reasons a PDU could not be decoded. Callers treat all of them as
/// "malformed, skip this entry".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PduError {
    #[error("odd number of hex digits ({0})")]
    OddLength(usize),

    #[error("invalid hex digit {digit:?} at position {position}")]
    InvalidHex { position: usize, digit: char },

    #[error("PDU truncated while reading {field}")]
    Truncated { field: &'static str },

    #[error("unsupported message type indicator {0}")]
    UnsupportedMessageType(u8),
}

const MTI_MASK: u8 = 0x03;
const MTI_DELIVER: u8 = 0x00;
const MTI_SUBMIT: u8 = 0x01;
const UDHI: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Mobile-terminated (SMS-DELIVER)
    Deliver,
    /// Mobile-originated, as found in the sent/draft storage (SMS-SUBMIT)
    Submit,
}

/// Service centre time stamp of an SMS-DELIVER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTimestamp {
    /// Two-digit year
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Offset from UTC in quarters of an hour
    pub tz_quarters: i8,
}

impl ServiceTimestamp {
    fn from_octets(octets: &[u8]) -> Result<Self, PduError> {
        let [year, month, day, hour, minute, second, tz] = octets else {
            return Err(PduError::Truncated {
                field: "service centre time stamp",
            });
        };
        let swapped = |b: &u8| (b & 0x0F) * 10 + (b >> 4);
        // Bit 3 of the zone octet is the sign; the rest is swapped BCD
        let magnitude = ((tz & 0x07) * 10 + (tz >> 4)) as i8;
        Ok(Self {
            year: swapped(year),
            month: swapped(month),
            day: swapped(day),
            hour: swapped(hour),
            minute: swapped(minute),
            second: swapped(second),
            tz_quarters: if tz & 0x08 != 0 { -magnitude } else { magnitude },
        })
    }
}

impl fmt::Display for ServiceTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:02},{:02}:{:02}:{:02}{:+03}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.tz_quarters
        )
    }
}

/// One decoded PDU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PduEntry {
    pub kind: MessageKind,
    pub service_centre: Option<String>,
    /// Originating address (DELIVER) or destination address (SUBMIT)
    pub address: String,
    pub protocol_id: u8,
    pub dcs: u8,
    pub encoding: Encoding,
    pub timestamp: Option<ServiceTimestamp>,
    pub concat: Option<ConcatInfo>,
    /// User data after the header: septet values for GSM 7-bit,
    /// octets otherwise
    pub raw_bytes: Vec<u8>,
    /// `None` when the data coding scheme is not supported
    pub text: Option<String>,
}

/// Forward-only cursor over PDU octets.
pub(crate) struct OctetReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> OctetReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn u8(&mut self, field: &'static str) -> Result<u8, PduError> {
        let byte = *self.data.get(self.pos).ok_or(PduError::Truncated { field })?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], PduError> {
        let slice = self
            .data
            .get(self.pos..self.pos + len)
            .ok_or(PduError::Truncated { field })?;
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }
}

/// Decode one hex-encoded PDU line.
pub fn decode(hex: &str) -> Result<PduEntry, PduError> {
    let bytes = parse_hex(hex.trim())?;
    let mut reader = OctetReader::new(&bytes);

    let service_centre = address::read_service_centre(&mut reader)?;
    let first_octet = reader.u8("first octet")?;
    let kind = match first_octet & MTI_MASK {
        MTI_DELIVER => MessageKind::Deliver,
        MTI_SUBMIT => MessageKind::Submit,
        other => return Err(PduError::UnsupportedMessageType(other)),
    };

    if kind == MessageKind::Submit {
        reader.u8("message reference")?;
    }
    let address = address::read_address(&mut reader)?;
    let protocol_id = reader.u8("protocol identifier")?;
    let dcs = reader.u8("data coding scheme")?;

    let timestamp = match kind {
        MessageKind::Deliver => Some(ServiceTimestamp::from_octets(
            reader.take(7, "service centre time stamp")?,
        )?),
        MessageKind::Submit => {
            let vp_len = match (first_octet >> 3) & 0x03 {
                0 => 0,
                2 => 1,
                _ => 7,
            };
            reader.take(vp_len, "validity period")?;
            None
        }
    };

    let user_data_length = usize::from(reader.u8("user data length")?);
    let has_header = first_octet & UDHI != 0;

    let (encoding, raw_bytes, concat, text) = match Encoding::from_dcs(dcs) {
        Some(Encoding::Gsm7) => {
            let octets = reader.take((user_data_length * 7).div_ceil(8), "user data")?;
            let (concat, header_septets) = if has_header {
                let (header, header_octets) = UserDataHeader::parse(octets)?;
                (header.concat(), (header_octets * 8).div_ceil(7))
            } else {
                (None, 0)
            };
            let septets = alphabet::unpack_septets(octets, user_data_length)?;
            let body = septets
                .get(header_septets..)
                .ok_or(PduError::Truncated { field: "user data" })?
                .to_vec();
            let text = alphabet::decode_gsm7(&body);
            (Encoding::Gsm7, body, concat, Some(text))
        }
        Some(encoding) => {
            let octets = reader.take(user_data_length, "user data")?;
            let (concat, body) = split_header(octets, has_header)?;
            let text = match encoding {
                Encoding::Ucs2 => alphabet::decode_ucs2(body),
                _ => alphabet::decode_8bit(body),
            };
            (encoding, body.to_vec(), concat, Some(text))
        }
        None => {
            // Unknown alphabet: keep whatever octets are present
            let available = user_data_length.min(reader.remaining());
            let octets = reader.take(available, "user data")?;
            let (concat, body) = split_header(octets, has_header).unwrap_or((None, octets));
            (Encoding::EightBit, body.to_vec(), concat, None)
        }
    };

    Ok(PduEntry {
        kind,
        service_centre,
        address,
        protocol_id,
        dcs,
        encoding,
        timestamp,
        concat,
        raw_bytes,
        text,
    })
}

fn split_header(octets: &[u8], has_header: bool) -> Result<(Option<ConcatInfo>, &[u8]), PduError> {
    if !has_header {
        return Ok((None, octets));
    }
    let (header, header_octets) = UserDataHeader::parse(octets)?;
    let body = octets
        .get(header_octets..)
        .ok_or(PduError::Truncated { field: "user data" })?;
    Ok((header.concat(), body))
}
