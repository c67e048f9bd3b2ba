//! Address fields: service centre, originating and destination addresses.

use super::alphabet::{decode_gsm7, unpack_septets};
use super::{OctetReader, PduError};

const TYPE_OF_NUMBER_MASK: u8 = 0x70;
const INTERNATIONAL: u8 = 0x10;
const ALPHANUMERIC: u8 = 0x50;

/// Read the leading SMSC block. Length 0 means the modem omitted it.
pub(crate) fn read_service_centre(reader: &mut OctetReader<'_>) -> Result<Option<String>, PduError> {
    let length = usize::from(reader.u8("service centre length")?);
    if length == 0 {
        return Ok(None);
    }
    let type_of_address = reader.u8("service centre type")?;
    let digits = reader.take(length - 1, "service centre address")?;
    let number = semi_octets(digits, digits.len() * 2);
    Ok(Some(with_prefix(type_of_address, number)))
}

/// Read an originating/destination address.
///
/// The length octet counts useful semi-octets, not octets.
pub(crate) fn read_address(reader: &mut OctetReader<'_>) -> Result<String, PduError> {
    let semi_octet_count = usize::from(reader.u8("address length")?);
    let type_of_address = reader.u8("address type")?;
    let raw = reader.take(semi_octet_count.div_ceil(2), "address digits")?;

    if type_of_address & TYPE_OF_NUMBER_MASK == ALPHANUMERIC {
        let septets = unpack_septets(raw, semi_octet_count * 4 / 7)?;
        return Ok(decode_gsm7(&septets));
    }

    Ok(with_prefix(type_of_address, semi_octets(raw, semi_octet_count)))
}

fn with_prefix(type_of_address: u8, number: String) -> String {
    if type_of_address & TYPE_OF_NUMBER_MASK == INTERNATIONAL && !number.is_empty() {
        format!("+{}", number)
    } else {
        number
    }
}

/// Swapped-nibble BCD digits; stops at the `F` filler.
fn semi_octets(raw: &[u8], max_digits: usize) -> String {
    raw.iter()
        .flat_map(|&b| [b & 0x0F, b >> 4])
        .take(max_digits)
        .take_while(|&nibble| nibble != 0x0F)
        .map(|nibble| match nibble {
            0..=9 => char::from(b'0' + nibble),
            0x0A => '*',
            0x0B => '#',
            0x0C => 'a',
            0x0D => 'b',
            _ => 'c',
        })
        .collect()
}
