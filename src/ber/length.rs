//! BER length encoding and decoding.
//!
//! Length encoding follows X.690 Section 8.1.3:
//! - Short form: Single byte, bit 8=0, value 0-127
//! - Long form: Initial byte (bit 8=1, bits 7-1=count), followed by length bytes
//! - Indefinite form (0x80): rejected, SNMP never uses it

use crate::error::{DecodeErrorKind, Error, Result};

/// Maximum length we'll accept.
///
/// Nothing that fits in a UDP datagram comes close; this only bounds how far
/// a hostile length field can push the decoder.
pub const MAX_LENGTH: usize = 0x200000;

/// A decoded length together with how it was written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Length {
    /// Content length in bytes.
    pub len: usize,
    /// Number of bytes the length field itself occupied.
    pub consumed: usize,
}

impl Length {
    /// Whether the long form (more than one length byte) was used.
    pub fn is_long_form(&self) -> bool {
        self.consumed > 1
    }
}

/// Encode a length value (returns bytes in reverse order for prepending).
///
/// Uses short form for lengths <= 127, long form otherwise.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];
    if len <= 127 {
        buf[0] = len as u8;
        return (buf, 1);
    }

    let mut count = 0;
    let mut rest = len;
    while rest > 0 && count < 4 {
        buf[count] = rest as u8;
        rest >>= 8;
        count += 1;
    }
    buf[count] = 0x80 | count as u8;
    (buf, count + 1)
}

/// Decode a length from bytes.
///
/// `base_offset` is the position of `data` inside the enclosing message and
/// only feeds error reporting.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<Length> {
    let Some(&first) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };

    if first == 0x80 {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::IndefiniteLength,
        ));
    }

    if first & 0x80 == 0 {
        return Ok(Length {
            len: first as usize,
            consumed: 1,
        });
    }

    let num_octets = (first & 0x7F) as usize;
    if num_octets > 4 {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthTooLong { octets: num_octets },
        ));
    }
    if data.len() < 1 + num_octets {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    }

    let len = data[1..=num_octets]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);

    if len > MAX_LENGTH {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthExceedsMax {
                length: len,
                max: MAX_LENGTH,
            },
        ));
    }

    Ok(Length {
        len,
        consumed: 1 + num_octets,
    })
}
