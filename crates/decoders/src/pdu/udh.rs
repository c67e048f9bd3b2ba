//! User data header (TP-UDH) and the concatenation information elements.

use super::PduError;
use serde::{Deserialize, Serialize};

const IEI_CONCAT_8BIT: u8 = 0x00;
const IEI_CONCAT_16BIT: u8 = 0x08;

/// Position of one part inside a concatenated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatInfo {
    /// Shared by every part of one logical message
    pub reference: u16,
    /// 1-based position within the message
    pub sequence: u8,
    /// Number of parts in the message
    pub total: u8,
}

/// A single information element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationElement {
    pub id: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDataHeader {
    pub elements: Vec<InformationElement>,
}

impl UserDataHeader {
    /// Parse the header at the start of the user data.
    ///
    /// Returns the header and its size in octets, including the UDHL octet.
    pub fn parse(user_data: &[u8]) -> Result<(Self, usize), PduError> {
        let header_len = usize::from(*user_data.first().ok_or(PduError::Truncated {
            field: "user data header length",
        })?);
        let body = user_data
            .get(1..1 + header_len)
            .ok_or(PduError::Truncated {
                field: "user data header",
            })?;

        let mut elements = Vec::new();
        let mut rest = body;
        while let [id, len, tail @ ..] = rest {
            let data = tail.get(..usize::from(*len)).ok_or(PduError::Truncated {
                field: "information element",
            })?;
            elements.push(InformationElement {
                id: *id,
                data: data.to_vec(),
            });
            rest = tail.get(usize::from(*len)..).unwrap_or_default();
        }

        Ok((Self { elements }, header_len + 1))
    }

    /// Concatenation info from the first well-formed 8-bit or 16-bit
    /// reference element. Elements claiming part 0 or 0 parts are ignored.
    pub fn concat(&self) -> Option<ConcatInfo> {
        self.elements.iter().find_map(|ie| {
            let info = match (ie.id, ie.data.as_slice()) {
                (IEI_CONCAT_8BIT, [reference, total, sequence]) => ConcatInfo {
                    reference: u16::from(*reference),
                    sequence: *sequence,
                    total: *total,
                },
                (IEI_CONCAT_16BIT, [hi, lo, total, sequence]) => ConcatInfo {
                    reference: u16::from_be_bytes([*hi, *lo]),
                    sequence: *sequence,
                    total: *total,
                },
                _ => return None,
            };
            (info.total > 0 && info.sequence > 0).then_some(info)
        })
    }
}
