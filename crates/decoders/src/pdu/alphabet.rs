//! User-data alphabets (GSM 03.38).

use super::PduError;
use serde::{Deserialize, Serialize};

/// Character encoding of the user data, selected by the data coding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// GSM default alphabet, septets packed into octets
    Gsm7,
    /// Raw octets
    EightBit,
    /// Big-endian 16-bit units
    Ucs2,
}

impl Encoding {
    /// Map a data coding scheme octet to its alphabet.
    ///
    /// Returns `None` for compressed text and reserved values; such messages
    /// carry nothing this crate can turn into text.
    pub fn from_dcs(dcs: u8) -> Option<Self> {
        match dcs >> 4 {
            // General data coding (0x4..0x7 additionally marked for automatic
            // deletion): bit 5 = compressed, bits 3..2 = alphabet
            0x0..=0x7 => {
                if dcs & 0x20 != 0 {
                    return None;
                }
                match (dcs >> 2) & 0x03 {
                    0 => Some(Self::Gsm7),
                    1 => Some(Self::EightBit),
                    2 => Some(Self::Ucs2),
                    _ => None,
                }
            }
            // Message waiting indication, discard / store
            0xC | 0xD => Some(Self::Gsm7),
            // Message waiting indication, store UCS-2
            0xE => Some(Self::Ucs2),
            // Data coding / message class
            0xF => {
                if dcs & 0x04 != 0 {
                    Some(Self::EightBit)
                } else {
                    Some(Self::Gsm7)
                }
            }
            _ => None,
        }
    }
}

const ESCAPE: u8 = 0x1B;

const GSM7_BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à', //
];

fn basic_char(septet: u8) -> char {
    GSM7_BASIC
        .get(usize::from(septet & 0x7F))
        .copied()
        .unwrap_or(' ')
}

fn extension_char(septet: u8) -> Option<char> {
    match septet {
        0x0A => Some('\u{0C}'),
        0x14 => Some('^'),
        0x28 => Some('{'),
        0x29 => Some('}'),
        0x2F => Some('\\'),
        0x3C => Some('['),
        0x3D => Some('~'),
        0x3E => Some(']'),
        0x40 => Some('|'),
        0x65 => Some('€'),
        _ => None,
    }
}

/// Unpack `count` septets from packed GSM 7-bit user data.
///
/// Septet `i` starts at bit `7 * i`, least significant bit first.
pub fn unpack_septets(data: &[u8], count: usize) -> Result<Vec<u8>, PduError> {
    let needed = (count * 7).div_ceil(8);
    if data.len() < needed {
        return Err(PduError::Truncated {
            field: "7-bit user data",
        });
    }

    let mut septets = Vec::with_capacity(count);
    for i in 0..count {
        let bit = i * 7;
        let shift = bit % 8;
        let byte_idx = bit / 8;
        let current = u16::from(data.get(byte_idx).copied().unwrap_or(0));
        let mut value = current >> shift;
        if shift > 1 {
            let next = u16::from(data.get(byte_idx + 1).copied().unwrap_or(0));
            value |= next << (8 - shift);
        }
        septets.push((value & 0x7F) as u8);
    }
    Ok(septets)
}

/// Decode unpacked septets through the default alphabet and its extension table.
///
/// An escape followed by an unknown code falls back to the basic character;
/// a trailing lone escape is dropped.
pub fn decode_gsm7(septets: &[u8]) -> String {
    let mut text = String::with_capacity(septets.len());
    let mut escaped = false;
    for &septet in septets {
        if escaped {
            text.push(extension_char(septet).unwrap_or_else(|| basic_char(septet)));
            escaped = false;
        } else if septet == ESCAPE {
            escaped = true;
        } else {
            text.push(basic_char(septet));
        }
    }
    text
}

/// 8-bit data is passed through one octet per character (ISO-8859-1).
pub fn decode_8bit(octets: &[u8]) -> String {
    octets.iter().map(|&b| char::from(b)).collect()
}

/// Decode big-endian UCS-2 / UTF-16. Unpaired surrogates become U+FFFD and an
/// odd trailing octet is ignored.
pub fn decode_ucs2(octets: &[u8]) -> String {
    let units = octets
        .chunks_exact(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            _ => 0xFFFD,
        });
    char::decode_utf16(units)
        .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
