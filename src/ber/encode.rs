//! BER encoding.
//!
//! Uses a reverse buffer approach: writes from end backwards to avoid
//! needing to pre-calculate lengths. Callers therefore push the fields of
//! a constructed value in reverse order.

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;
use crate::uint64::Uint64;
use bytes::Bytes;

/// Buffer for BER encoding that writes backwards.
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create a new encode buffer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create a new encode buffer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Push a single byte (prepends to front).
    pub fn push_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Push multiple bytes (prepends to front, order preserved in output).
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Push a BER length encoding.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, count) = encode_length(len);
        self.buf.extend_from_slice(&bytes[..count]);
    }

    /// Push a BER tag.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Get the current length of encoded data.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a constructed type (SEQUENCE, PDU, etc).
    ///
    /// Calls the closure to encode contents, then wraps with length and tag.
    pub fn push_constructed<F>(&mut self, tag: u8, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let start_len = self.len();
        f(self);
        let content_len = self.len() - start_len;
        self.push_length(content_len);
        self.push_tag(tag);
    }

    /// Encode a SEQUENCE.
    pub fn push_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Encode a primitive TLV from already-encoded content.
    pub fn push_primitive(&mut self, tag: u8, content: &[u8]) {
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag);
    }

    /// Encode an INTEGER.
    pub fn push_integer(&mut self, value: i32) {
        self.push_integer_tagged(tag::universal::INTEGER, value);
    }

    /// Encode a signed 32-bit value under an arbitrary tag.
    pub fn push_integer_tagged(&mut self, tag: u8, value: i32) {
        let (arr, len) = encode_integer_stack(value);
        self.push_primitive(tag, &arr[4 - len..]);
    }

    /// Encode an unsigned 32-bit integer with a specific tag.
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let (arr, len) = encode_unsigned32_stack(value);
        self.push_primitive(tag, &arr[5 - len..]);
    }

    /// Encode an unsigned 64-bit integer with a specific tag.
    pub fn push_unsigned64(&mut self, tag: u8, value: Uint64) {
        let octets = value.to_octets();
        self.push_bytes(&octets);
        let mut len = octets.len();
        if octets[0] & 0x80 != 0 {
            self.push_byte(0);
            len += 1;
        }
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Encode an OCTET STRING.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_primitive(tag::universal::OCTET_STRING, data);
    }

    /// Encode a NULL.
    pub fn push_null(&mut self) {
        self.push_primitive(tag::universal::NULL, &[]);
    }

    /// Encode an OBJECT IDENTIFIER.
    pub fn push_oid(&mut self, oid: &Oid) {
        self.push_oid_tagged(tag::universal::OBJECT_IDENTIFIER, oid);
    }

    /// Encode an OBJECT IDENTIFIER under an arbitrary tag.
    pub fn push_oid_tagged(&mut self, tag: u8, oid: &Oid) {
        let ber = oid.to_ber_smallvec();
        self.push_primitive(tag, &ber);
    }

    /// Encode an IP address.
    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_primitive(tag::application::IP_ADDRESS, &addr);
    }

    /// Finalize and return the encoded bytes.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }

    /// Finalize and return as `Vec<u8>`.
    pub fn finish_vec(mut self) -> Vec<u8> {
        self.buf.reverse();
        self.buf
    }
}

impl Default for EncodeBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a signed 32-bit integer in minimal BER form.
///
/// The valid bytes are at the END of the array.
#[inline]
fn encode_integer_stack(value: i32) -> ([u8; 4], usize) {
    let bytes = value.to_be_bytes();
    let pad = if value >= 0 { 0x00 } else { 0xFF };

    // Drop a leading pad byte only if the next byte still carries the sign.
    let mut start = 0;
    while start < 3 && bytes[start] == pad && (bytes[start + 1] & 0x80 == pad & 0x80) {
        start += 1;
    }

    (bytes, 4 - start)
}

/// Encode an unsigned 32-bit integer, adding a 0x00 prefix when the MSB is set.
///
/// The valid bytes are at the END of the array.
#[inline]
fn encode_unsigned32_stack(value: u32) -> ([u8; 5], usize) {
    let mut result = [0u8; 5];
    result[1..].copy_from_slice(&value.to_be_bytes());

    let significant = (4 - (value.leading_zeros() / 8) as usize).max(1);
    let first = result[5 - significant];
    if first & 0x80 != 0 {
        (result, significant + 1)
    } else {
        (result, significant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_integer(value: i32) -> Vec<u8> {
        let (arr, len) = encode_integer_stack(value);
        arr[4 - len..].to_vec()
    }

    fn encode_unsigned32(value: u32) -> Vec<u8> {
        let (arr, len) = encode_unsigned32_stack(value);
        arr[5 - len..].to_vec()
    }

    fn tlv(f: impl FnOnce(&mut EncodeBuf)) -> Vec<u8> {
        let mut buf = EncodeBuf::new();
        f(&mut buf);
        buf.finish_vec()
    }

    #[test]
    fn test_encode_integer() {
        assert_eq!(encode_integer(0), vec![0]);
        assert_eq!(encode_integer(1), vec![1]);
        assert_eq!(encode_integer(0x7e), vec![0x7e]);
        assert_eq!(encode_integer(127), vec![127]);
        assert_eq!(encode_integer(128), vec![0, 128]);
        assert_eq!(encode_integer(-1), vec![0xFF]);
        assert_eq!(encode_integer(-128), vec![0x80]);
        assert_eq!(encode_integer(-129), vec![0xFF, 0x7F]);
        assert_eq!(encode_integer(0x1000_0000), vec![0x10, 0, 0, 0]);
        assert_eq!(encode_integer(i32::MAX), vec![0x7F, 0xFF, 0xFF, 0xFF]);
        assert_eq!(encode_integer(i32::MIN), vec![0x80, 0, 0, 0]);
    }

    #[test]
    fn test_encode_unsigned32() {
        assert_eq!(encode_unsigned32(0), vec![0]);
        assert_eq!(encode_unsigned32(127), vec![127]);
        assert_eq!(encode_unsigned32(128), vec![0, 128]);
        assert_eq!(encode_unsigned32(255), vec![0, 255]);
        assert_eq!(encode_unsigned32(256), vec![1, 0]);
        assert_eq!(encode_unsigned32(u32::MAX), vec![0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encode_unsigned64() {
        assert_eq!(
            tlv(|b| b.push_unsigned64(tag::application::COUNTER64, Uint64::ZERO)),
            vec![0x46, 0x01, 0x00]
        );
        assert_eq!(
            tlv(|b| b.push_unsigned64(tag::application::COUNTER64, Uint64::MAX)),
            vec![0x46, 0x09, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            tlv(|b| b.push_unsigned64(0x47, Uint64::from(0x0102u64))),
            vec![0x47, 0x02, 0x01, 0x02]
        );
    }

    #[test]
    fn test_encode_null() {
        assert_eq!(tlv(|b| b.push_null()), vec![0x05, 0x00]);
    }

    #[test]
    fn test_encode_integer_tlv() {
        assert_eq!(tlv(|b| b.push_integer(0x7e)), vec![0x02, 0x01, 0x7e]);
        assert_eq!(tlv(|b| b.push_integer(-128)), vec![0x02, 0x01, 0x80]);
        assert_eq!(
            tlv(|b| b.push_integer(-2147483648)),
            vec![0x02, 0x04, 0x80, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            tlv(|b| b.push_integer_tagged(0x47, 4386)),
            vec![0x47, 0x02, 0x11, 0x22]
        );
    }

    #[test]
    fn test_encode_oid() {
        assert_eq!(
            tlv(|b| b.push_oid(&crate::oid!(1, 3, 6, 1, 4, 1, 0))),
            vec![0x06, 0x06, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x00]
        );
    }

    #[test]
    fn test_encode_sequence() {
        let bytes = tlv(|buf| {
            buf.push_sequence(|buf| {
                // reverse order
                buf.push_integer(2);
                buf.push_integer(1);
            })
        });
        assert_eq!(bytes, vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn test_long_content_length() {
        let data = vec![0xAB; 200];
        let bytes = tlv(|b| b.push_octet_string(&data));
        assert_eq!(&bytes[..3], &[0x04, 0x81, 200]);
        assert_eq!(bytes.len(), 203);
    }
}
