//! BER decoding.
//!
//! Zero-copy decoding using `Bytes` to avoid allocations. Offsets in errors
//! are relative to the buffer the decoder was created from; sub-decoders
//! carry their parent's base offset so positions stay message-absolute.

use super::length::{Length, decode_length};
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// BER decoder that reads from a byte buffer.
#[derive(Clone)]
pub struct Decoder {
    data: Bytes,
    offset: usize,
    base: usize,
}

impl Decoder {
    /// Create a new decoder from bytes.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            base: 0,
        }
    }

    /// Create a decoder from a byte slice (copies the data).
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    fn error(&self, kind: DecodeErrorKind) -> Error {
        let offset = self.base + self.offset;
        tracing::debug!(target: "async_snmp_agent::ber", { snmp.offset = %offset, kind = %kind }, "decode error");
        Error::decode(offset, kind)
    }

    /// Get the current offset (absolute within the original message).
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Check if we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Peek at the next byte without consuming it.
    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.peek_byte()
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self
            .peek_byte()
            .ok_or_else(|| self.error(DecodeErrorKind::TruncatedData))?;
        self.offset += 1;
        Ok(byte)
    }

    /// Read a tag byte.
    pub fn read_tag(&mut self) -> Result<u8> {
        self.read_byte()
    }

    /// Read a length, keeping track of the form it was written in.
    pub fn read_length_field(&mut self) -> Result<Length> {
        let length = decode_length(&self.data[self.offset..], self.offset())?;
        self.offset += length.consumed;
        Ok(length)
    }

    /// Read a length.
    pub fn read_length(&mut self) -> Result<usize> {
        Ok(self.read_length_field()?.len)
    }

    /// Read raw bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.offset.saturating_add(len) > self.data.len() {
            return Err(self.error(DecodeErrorKind::InsufficientData {
                needed: len,
                available: self.remaining(),
            }));
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read and expect a specific tag, returning the content length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let actual = self.read_tag()?;
        if actual != expected {
            self.offset -= 1;
            return Err(self.error(DecodeErrorKind::UnexpectedTag { expected, actual }));
        }
        self.read_length()
    }

    /// Read a BER integer (signed).
    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read a signed 32-bit integer value given the length.
    ///
    /// Encodings wider than 4 bytes are rejected.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        if len == 0 {
            return Err(self.error(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 4 {
            return Err(self.error(DecodeErrorKind::IntegerTooLong { length: len, max: 4 }));
        }

        let bytes = self.read_bytes(len)?;
        let init: i32 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        Ok(bytes.iter().fold(init, |acc, &b| (acc << 8) | b as i32))
    }

    /// Read an unsigned integer value of at most `width` significant bytes.
    ///
    /// One extra leading 0x00 byte is tolerated (sign padding per X.690
    /// 8.3). Returns the significant bytes, big-endian.
    pub fn read_unsigned_bytes(&mut self, len: usize, width: usize) -> Result<Bytes> {
        if len == 0 {
            return Err(self.error(DecodeErrorKind::ZeroLengthInteger));
        }
        let start = self.offset;
        if len > width + 1 {
            return Err(self.error(DecodeErrorKind::IntegerTooLong { length: len, max: width }));
        }
        let bytes = self.read_bytes(len)?;
        if len == width + 1 {
            if bytes[0] != 0 {
                self.offset = start;
                return Err(self.error(DecodeErrorKind::IntegerTooLong { length: len, max: width }));
            }
            return Ok(bytes.slice(1..));
        }
        Ok(bytes)
    }

    /// Read an unsigned 32-bit integer value given the length.
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        let bytes = self.read_unsigned_bytes(len, 4)?;
        Ok(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        if self.peek_tag() == Some(tag::universal::OCTET_STRING_CONSTRUCTED) {
            return Err(self.error(DecodeErrorKind::ConstructedOctetString));
        }
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return Err(self.error(DecodeErrorKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    /// Read an OID given a pre-read length.
    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let at = self.offset();
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|e| match e {
            Error::Decode { offset, kind } => Error::decode(at + offset, kind),
            other => other,
        })
    }

    /// Read a SEQUENCE, returning a decoder for its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed type with a specific tag, returning a decoder for its contents.
    pub fn read_constructed(&mut self, expected_tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        self.sub_decoder(len)
    }

    /// Read an IP address.
    pub fn read_ip_address(&mut self) -> Result<[u8; 4]> {
        let len = self.expect_tag(tag::application::IP_ADDRESS)?;
        self.read_ip_address_value(len)
    }

    /// Read an IP address value given the length.
    pub fn read_ip_address_value(&mut self, len: usize) -> Result<[u8; 4]> {
        if len != 4 {
            return Err(self.error(DecodeErrorKind::InvalidIpAddressLength { length: len }));
        }
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Skip a TLV (tag-length-value) without parsing.
    pub fn skip_tlv(&mut self) -> Result<()> {
        let _tag = self.read_tag()?;
        let len = self.read_length()?;
        let new_offset = self.offset.saturating_add(len);
        if new_offset > self.data.len() {
            return Err(self.error(DecodeErrorKind::TlvOverflow));
        }
        self.offset = new_offset;
        Ok(())
    }

    /// Create a sub-decoder for a portion of the remaining data.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let base = self.offset();
        let content = self.read_bytes(len)?;
        Ok(Decoder {
            data: content,
            offset: 0,
            base,
        })
    }

    /// Get remaining data as a slice.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.offset..]
    }
}
