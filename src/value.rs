//! SNMP value types.
//!
//! [`Value`] is the closed set of SNMP data kinds. [`Data`] pairs a value
//! with the BER tag it travels under: values decoded from the wire keep the
//! tag that was actually read, so an alternate tag survives a round trip.
//! Which tags decode as which kind is decided by a [`TypeRegistry`].

mod registry;

pub use registry::{TypeRegistry, default_registry};

use std::fmt;
use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, RangeErrorKind, Result};
use crate::oid::Oid;
use crate::uint64::Uint64;

/// The kinds of SNMP value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    OctetString,
    ObjectIdentifier,
    IpAddress,
    Counter32,
    Unsigned32,
    TimeTicks,
    Opaque,
    Counter64,
    Null,
}

impl ValueKind {
    /// Every kind, in registration order.
    pub const ALL: [ValueKind; 10] = [
        ValueKind::Integer,
        ValueKind::OctetString,
        ValueKind::ObjectIdentifier,
        ValueKind::IpAddress,
        ValueKind::Counter32,
        ValueKind::Unsigned32,
        ValueKind::TimeTicks,
        ValueKind::Opaque,
        ValueKind::Counter64,
        ValueKind::Null,
    ];

    /// Type name used by the registry.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Integer => "Integer",
            ValueKind::OctetString => "OctetString",
            ValueKind::ObjectIdentifier => "ObjectIdentifier",
            ValueKind::IpAddress => "IpAddress",
            ValueKind::Counter32 => "Counter32",
            ValueKind::Unsigned32 => "Unsigned32",
            ValueKind::TimeTicks => "TimeTicks",
            ValueKind::Opaque => "Opaque",
            ValueKind::Counter64 => "Counter64",
            ValueKind::Null => "Null",
        }
    }

    /// Look up a kind by its type name.
    pub fn from_name(name: &str) -> Option<ValueKind> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The SMI tag for this kind.
    pub fn default_tag(self) -> u8 {
        match self {
            ValueKind::Integer => tag::universal::INTEGER,
            ValueKind::OctetString => tag::universal::OCTET_STRING,
            ValueKind::ObjectIdentifier => tag::universal::OBJECT_IDENTIFIER,
            ValueKind::IpAddress => tag::application::IP_ADDRESS,
            ValueKind::Counter32 => tag::application::COUNTER32,
            ValueKind::Unsigned32 => tag::application::UNSIGNED32,
            ValueKind::TimeTicks => tag::application::TIMETICKS,
            ValueKind::Opaque => tag::application::OPAQUE,
            ValueKind::Counter64 => tag::application::COUNTER64,
            ValueKind::Null => tag::universal::NULL,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flavours of NULL: a plain NULL or one of the varbind exception markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullKind {
    Null,
    /// The object is not known to the agent.
    NoSuchObject,
    /// The object exists but this instance does not.
    NoSuchInstance,
    /// A walk ran past the last object.
    EndOfMibView,
}

impl NullKind {
    /// Tag each flavour is written with.
    pub fn tag(self) -> u8 {
        match self {
            NullKind::Null => tag::universal::NULL,
            NullKind::NoSuchObject => tag::context::NO_SUCH_OBJECT,
            NullKind::NoSuchInstance => tag::context::NO_SUCH_INSTANCE,
            NullKind::EndOfMibView => tag::context::END_OF_MIB_VIEW,
        }
    }

    /// Exception marker for a context tag, if it is one.
    pub fn from_tag(tag: u8) -> Option<NullKind> {
        match tag {
            tag::context::NO_SUCH_OBJECT => Some(NullKind::NoSuchObject),
            tag::context::NO_SUCH_INSTANCE => Some(NullKind::NoSuchInstance),
            tag::context::END_OF_MIB_VIEW => Some(NullKind::EndOfMibView),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            NullKind::Null => "NULL",
            NullKind::NoSuchObject => "noSuchObject",
            NullKind::NoSuchInstance => "noSuchInstance",
            NullKind::EndOfMibView => "endOfMibView",
        }
    }
}

/// SNMP value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// INTEGER (signed 32-bit)
    Integer(i32),
    /// OCTET STRING (arbitrary bytes)
    OctetString(Bytes),
    /// OBJECT IDENTIFIER, always canonical
    ObjectIdentifier(Oid),
    /// IpAddress (4 bytes, network order)
    IpAddress([u8; 4]),
    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),
    /// Unsigned32 / Gauge32
    Unsigned32(u32),
    /// TimeTicks (hundredths of a second)
    TimeTicks(u32),
    /// Opaque (arbitrary bytes, encoded like an OCTET STRING)
    Opaque(Bytes),
    /// Counter64 (unsigned 64-bit, wrapping)
    Counter64(Uint64),
    /// NULL or an exception marker
    Null(NullKind),
}

impl Value {
    pub const NULL: Value = Value::Null(NullKind::Null);
    pub const NO_SUCH_OBJECT: Value = Value::Null(NullKind::NoSuchObject);
    pub const NO_SUCH_INSTANCE: Value = Value::Null(NullKind::NoSuchInstance);
    pub const END_OF_MIB_VIEW: Value = Value::Null(NullKind::EndOfMibView);

    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::OctetString(_) => ValueKind::OctetString,
            Value::ObjectIdentifier(_) => ValueKind::ObjectIdentifier,
            Value::IpAddress(_) => ValueKind::IpAddress,
            Value::Counter32(_) => ValueKind::Counter32,
            Value::Unsigned32(_) => ValueKind::Unsigned32,
            Value::TimeTicks(_) => ValueKind::TimeTicks,
            Value::Opaque(_) => ValueKind::Opaque,
            Value::Counter64(_) => ValueKind::Counter64,
            Value::Null(_) => ValueKind::Null,
        }
    }

    /// The tag this value is written with unless told otherwise.
    pub fn default_tag(&self) -> u8 {
        match self {
            Value::Null(n) => n.tag(),
            other => other.kind().default_tag(),
        }
    }

    /// Integer from a wider value, range-checked.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_agent::Value;
    ///
    /// assert_eq!(Value::integer(-5).unwrap(), Value::Integer(-5));
    /// assert!(Value::integer(1 << 31).is_err());
    /// ```
    pub fn integer(v: i64) -> Result<Value> {
        i32::try_from(v).map(Value::Integer).map_err(|_| {
            Error::range(RangeErrorKind::ValueOutOfRange {
                value: v,
                type_name: ValueKind::Integer.name(),
            })
        })
    }

    /// Counter32, Unsigned32 or TimeTicks from a wider value, range-checked.
    pub fn unsigned(kind: ValueKind, v: i64) -> Result<Value> {
        let make: fn(u32) -> Value = match kind {
            ValueKind::Counter32 => Value::Counter32,
            ValueKind::Unsigned32 => Value::Unsigned32,
            ValueKind::TimeTicks => Value::TimeTicks,
            _ => return Err(Error::invalid_value("32-bit unsigned type", kind.name())),
        };
        u32::try_from(v).map(make).map_err(|_| {
            Error::range(RangeErrorKind::ValueOutOfRange {
                value: v,
                type_name: kind.name(),
            })
        })
    }

    /// IpAddress from dotted-quad text.
    pub fn ip_address_str(s: &str) -> Result<Value> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 4 {
            return Err(Error::invalid_value("dotted-quad IP address", s));
        }
        let mut addr = [0u8; 4];
        for (slot, part) in addr.iter_mut().zip(parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::invalid_value("dotted-quad IP address", s));
            }
            *slot = part.parse::<u8>().map_err(|_| {
                Error::range(RangeErrorKind::OctetOutOfRange {
                    component: part.into(),
                })
            })?;
        }
        Ok(Value::IpAddress(addr))
    }

    /// ObjectIdentifier from dotted text, canonicalized.
    pub fn object_identifier_str(s: &str) -> Result<Value> {
        Oid::canonicalize(s).map(Value::ObjectIdentifier)
    }

    /// Counter64 from decimal, `0x` hex, or leading-`0` octal text.
    pub fn counter64_str(s: &str) -> Result<Value> {
        Uint64::parse(s).map(Value::Counter64)
    }

    /// Build a value of the given kind from text.
    ///
    /// Octet strings take the text bytes verbatim. Null accepts an empty
    /// string, `NULL`, or the name of an exception marker.
    pub fn parse(kind: ValueKind, text: &str) -> Result<Value> {
        let number = || {
            text.trim()
                .parse::<i64>()
                .map_err(|_| Error::invalid_value(kind.name(), text))
        };
        match kind {
            ValueKind::Integer => Value::integer(number()?),
            ValueKind::OctetString => Ok(Value::OctetString(Bytes::copy_from_slice(
                text.as_bytes(),
            ))),
            ValueKind::Opaque => Ok(Value::Opaque(Bytes::copy_from_slice(text.as_bytes()))),
            ValueKind::ObjectIdentifier => Value::object_identifier_str(text),
            ValueKind::IpAddress => Value::ip_address_str(text),
            ValueKind::Counter32 | ValueKind::Unsigned32 | ValueKind::TimeTicks => {
                Value::unsigned(kind, number()?)
            }
            ValueKind::Counter64 => Value::counter64_str(text.trim()),
            ValueKind::Null => match text {
                "" | "NULL" => Ok(Value::NULL),
                "noSuchObject" => Ok(Value::NO_SUCH_OBJECT),
                "noSuchInstance" => Ok(Value::NO_SUCH_INSTANCE),
                "endOfMibView" => Ok(Value::END_OF_MIB_VIEW),
                _ => Err(Error::invalid_value("Null", text)),
            },
        }
    }

    /// Get as i32 (Integer only).
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as u32 (Counter32, Unsigned32, TimeTicks).
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Unsigned32(v) | Value::TimeTicks(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as raw bytes (OctetString, Opaque).
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(b) | Value::Opaque(b) => Some(b),
            _ => None,
        }
    }

    /// Get as an OID.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Get as an IPv4 address.
    pub fn as_ip(&self) -> Option<Ipv4Addr> {
        match self {
            Value::IpAddress(b) => Some(Ipv4Addr::from(*b)),
            _ => None,
        }
    }

    /// Get as a Counter64.
    pub fn as_counter64(&self) -> Option<Uint64> {
        match self {
            Value::Counter64(v) => Some(*v),
            _ => None,
        }
    }

    /// Check if this is an exception marker.
    pub fn is_exception(&self) -> bool {
        matches!(self, Value::Null(n) if *n != NullKind::Null)
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    for b in data {
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => f.write_str(s),
                Err(_) => {
                    f.write_str("0x")?;
                    write_hex(f, data)
                }
            },
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(a) => write!(f, "{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
            Value::Counter32(v) | Value::Unsigned32(v) | Value::TimeTicks(v) => {
                write!(f, "{}", v)
            }
            Value::Opaque(data) => {
                f.write_str("Opaque(0x")?;
                write_hex(f, data)?;
                f.write_str(")")
            }
            Value::Counter64(v) => write!(f, "{}", v),
            Value::Null(n) => f.write_str(n.name()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Self {
        Value::OctetString(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(addr: Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

impl From<Uint64> for Value {
    fn from(v: Uint64) -> Self {
        Value::Counter64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(Uint64::from(v))
    }
}

/// A value together with the tag it is encoded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    tag: u8,
    value: Value,
}

impl Data {
    /// Wrap a value under its default tag.
    pub fn new(value: Value) -> Self {
        Self {
            tag: value.default_tag(),
            value,
        }
    }

    /// Wrap a value under an explicit tag.
    ///
    /// The tag must be registered to the value's kind in `registry`.
    pub fn with_tag(registry: &TypeRegistry, tag: u8, value: Value) -> Result<Self> {
        match registry.kind_for_tag(tag) {
            Some(kind) if kind == value.kind() => Ok(Self { tag, value }),
            Some(kind) => Err(Error::type_conflict(format!(
                "tag 0x{:02x} belongs to {}, not {}",
                tag,
                kind,
                value.kind()
            ))),
            None => Err(Error::type_conflict(format!(
                "tag 0x{:02x} is not registered",
                tag
            ))),
        }
    }

    /// The tag this value will be encoded with.
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// The typed value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume and return the typed value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// The kind of the carried value.
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Encode tag, length and content.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        let tag = self.tag;
        match &self.value {
            Value::Integer(v) => buf.push_integer_tagged(tag, *v),
            Value::OctetString(data) | Value::Opaque(data) => buf.push_primitive(tag, data),
            Value::ObjectIdentifier(oid) => buf.push_oid_tagged(tag, oid),
            Value::IpAddress(addr) => buf.push_primitive(tag, addr),
            Value::Counter32(v) | Value::Unsigned32(v) | Value::TimeTicks(v) => {
                buf.push_unsigned32(tag, *v)
            }
            Value::Counter64(v) => buf.push_unsigned64(tag, *v),
            Value::Null(_) => buf.push_primitive(tag, &[]),
        }
    }

    /// Decode the next TLV, choosing the kind from the default registry.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        Self::decode_with(default_registry(), decoder)
    }

    /// Decode the next TLV, choosing the kind from `registry`.
    pub fn decode_with(registry: &TypeRegistry, decoder: &mut Decoder) -> Result<Self> {
        let at = decoder.offset();
        let tag = decoder
            .peek_tag()
            .ok_or_else(|| Error::decode(at, DecodeErrorKind::TruncatedData))?;
        let kind = registry.kind_for_tag(tag).ok_or_else(|| {
            tracing::debug!(target: "async_snmp_agent::ber", { snmp.offset = %at, tag = tag }, "data type for tag unknown");
            Error::decode(at, DecodeErrorKind::UnknownTag(tag))
        })?;
        Self::decode_as(decoder, kind)
    }

    /// Decode the next TLV as `kind`, whatever its tag.
    ///
    /// The tag that was read is kept.
    pub fn decode_as(decoder: &mut Decoder, kind: ValueKind) -> Result<Self> {
        let tag = decoder.read_tag()?;
        if kind == ValueKind::OctetString && tag == tag::universal::OCTET_STRING_CONSTRUCTED {
            return Err(Error::decode(
                decoder.offset() - 1,
                DecodeErrorKind::ConstructedOctetString,
            ));
        }
        let at = decoder.offset();
        let length = decoder.read_length_field()?;
        let len = length.len;

        let unsigned_needs_short_form = matches!(
            kind,
            ValueKind::Counter32 | ValueKind::Unsigned32 | ValueKind::TimeTicks | ValueKind::Counter64
        );
        if unsigned_needs_short_form && length.is_long_form() {
            return Err(Error::decode(at, DecodeErrorKind::LongFormLength));
        }

        let value = match kind {
            ValueKind::Integer => Value::Integer(decoder.read_integer_value(len)?),
            ValueKind::OctetString => Value::OctetString(decoder.read_bytes(len)?),
            ValueKind::Opaque => Value::Opaque(decoder.read_bytes(len)?),
            ValueKind::ObjectIdentifier => {
                let oid = decoder.read_oid_value(len)?;
                oid.validate_canonical()?;
                Value::ObjectIdentifier(oid)
            }
            ValueKind::IpAddress => Value::IpAddress(decoder.read_ip_address_value(len)?),
            ValueKind::Counter32 => Value::Counter32(decoder.read_unsigned32_value(len)?),
            ValueKind::Unsigned32 => Value::Unsigned32(decoder.read_unsigned32_value(len)?),
            ValueKind::TimeTicks => Value::TimeTicks(decoder.read_unsigned32_value(len)?),
            ValueKind::Counter64 => {
                let bytes = decoder.read_unsigned_bytes(len, 8)?;
                let v = Uint64::from_be_slice(&bytes)
                    .ok_or_else(|| Error::decode(at, DecodeErrorKind::IntegerOverflow))?;
                Value::Counter64(v)
            }
            ValueKind::Null => {
                if len != 0 {
                    return Err(Error::decode(at, DecodeErrorKind::InvalidNull));
                }
                Value::Null(NullKind::from_tag(tag).unwrap_or(NullKind::Null))
            }
        };

        Ok(Self { tag, value })
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        Data::new(value)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn encode(data: &Data) -> Vec<u8> {
        let mut buf = EncodeBuf::new();
        data.encode(&mut buf);
        buf.finish_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Data> {
        Data::decode(&mut Decoder::from_slice(bytes))
    }

    fn roundtrip(value: Value) {
        let data = Data::new(value);
        let bytes = encode(&data);
        assert_eq!(decode(&bytes).unwrap(), data, "bytes {:02x?}", bytes);
    }

    #[test]
    fn test_roundtrip_boundaries() {
        for v in [
            Value::Integer(0),
            Value::Integer(i32::MAX),
            Value::Integer(i32::MIN),
            Value::Counter32(0),
            Value::Counter32(u32::MAX),
            Value::Unsigned32(u32::MAX),
            Value::TimeTicks(0x8000_0000),
            Value::Counter64(Uint64::MAX),
            Value::Counter64(Uint64::ZERO),
            Value::from("hello"),
            Value::Opaque(Bytes::from_static(&[0xde, 0xad])),
            Value::IpAddress([255, 0, 0, 1]),
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 0)),
            Value::NULL,
            Value::NO_SUCH_OBJECT,
            Value::NO_SUCH_INSTANCE,
            Value::END_OF_MIB_VIEW,
        ] {
            roundtrip(v);
        }
    }

    #[test]
    fn test_integer_encodings() {
        let cases: &[(i32, &[u8])] = &[
            (0, &[0x02, 0x01, 0x00]),
            (0x7e, &[0x02, 0x01, 0x7e]),
            (-128, &[0x02, 0x01, 0x80]),
            (0x1000_0000, &[0x02, 0x04, 0x10, 0x00, 0x00, 0x00]),
            (0x7fff_ffff, &[0x02, 0x04, 0x7f, 0xff, 0xff, 0xff]),
            (-2147483648, &[0x02, 0x04, 0x80, 0x00, 0x00, 0x00]),
        ];
        for (v, bytes) in cases {
            assert_eq!(encode(&Data::new(Value::Integer(*v))), *bytes, "{}", v);
            assert_eq!(decode(bytes).unwrap().into_value(), Value::Integer(*v));
        }
    }

    #[test]
    fn test_oid_bytes() {
        let bytes = [0x06, 0x06, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x00];
        let data = decode(&bytes).unwrap();
        assert_eq!(
            data.value(),
            &Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 0))
        );
        assert_eq!(encode(&data), bytes);
    }

    #[test]
    fn test_decoded_oid_must_be_canonical() {
        // 1.3 has only two arcs
        assert!(matches!(
            decode(&[0x06, 0x01, 0x2b]),
            Err(Error::MalformedOid { .. })
        ));
    }

    #[test]
    fn test_exception_markers() {
        assert_eq!(encode(&Data::new(Value::NO_SUCH_OBJECT)), vec![0x80, 0x00]);
        assert_eq!(encode(&Data::new(Value::NO_SUCH_INSTANCE)), vec![0x81, 0x00]);
        assert_eq!(encode(&Data::new(Value::END_OF_MIB_VIEW)), vec![0x82, 0x00]);
        assert!(Value::END_OF_MIB_VIEW.is_exception());
        assert!(!Value::NULL.is_exception());
        assert!(decode(&[0x80, 0x01, 0x00]).is_err());
    }

    #[test]
    fn test_unsigned_width_rules() {
        let padded = decode(&[0x41, 0x05, 0x00, 0xff, 0xff, 0xff, 0xff]).unwrap();
        assert_eq!(padded.value(), &Value::Counter32(u32::MAX));

        assert!(decode(&[0x41, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00]).is_err());
        assert!(decode(&[0x43, 0x06, 0, 0, 0, 0, 0, 1]).is_err());
        assert!(matches!(
            decode(&[0x42, 0x81, 0x01, 0x05]),
            Err(Error::Decode {
                kind: DecodeErrorKind::LongFormLength,
                ..
            })
        ));

        let padded64 = decode(&[0x46, 0x09, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(padded64.unwrap().value(), &Value::Counter64(Uint64::MAX));
        assert!(decode(&[0x46, 0x09, 0x01, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_ip_address_length_mismatch() {
        assert!(matches!(
            decode(&[0x40, 0x05, 1, 2, 3, 4, 5]),
            Err(Error::Decode {
                kind: DecodeErrorKind::InvalidIpAddressLength { length: 5 },
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            decode(&[0x47, 0x01, 0x00]),
            Err(Error::Decode {
                kind: DecodeErrorKind::UnknownTag(0x47),
                ..
            })
        ));
    }

    #[test]
    fn test_decode_as_preserves_tag() {
        let mut dec = Decoder::from_slice(&[0x47, 0x02, 0x11, 0x22]);
        let data = Data::decode_as(&mut dec, ValueKind::Integer).unwrap();
        assert_eq!(data.tag(), 0x47);
        assert_eq!(data.value(), &Value::Integer(4386));
        assert_eq!(encode(&data), vec![0x47, 0x02, 0x11, 0x22]);
    }

    #[test]
    fn test_validated_constructors() {
        assert!(Value::integer(i32::MIN as i64).is_ok());
        assert!(matches!(
            Value::integer(i32::MAX as i64 + 1),
            Err(Error::Range { .. })
        ));
        assert_eq!(
            Value::unsigned(ValueKind::TimeTicks, 100).unwrap(),
            Value::TimeTicks(100)
        );
        assert!(Value::unsigned(ValueKind::Counter32, -1).is_err());
        assert!(Value::unsigned(ValueKind::Counter32, u32::MAX as i64 + 1).is_err());
        assert!(matches!(
            Value::unsigned(ValueKind::Integer, 1),
            Err(Error::InvalidValue { .. })
        ));

        assert_eq!(
            Value::ip_address_str("10.0.0.255").unwrap(),
            Value::IpAddress([10, 0, 0, 255])
        );
        assert!(matches!(
            Value::ip_address_str("10.0.0.256"),
            Err(Error::Range {
                kind: RangeErrorKind::OctetOutOfRange { .. }
            })
        ));
        assert!(matches!(
            Value::ip_address_str("10.0.0"),
            Err(Error::InvalidValue { .. })
        ));
        assert!(Value::ip_address_str("10.0.x.1").is_err());

        assert_eq!(
            Value::counter64_str("0xff").unwrap(),
            Value::Counter64(Uint64::from(255u64))
        );
        assert!(Value::object_identifier_str("1.3").is_err());
    }

    #[test]
    fn test_parse_by_kind() {
        assert_eq!(Value::parse(ValueKind::Integer, "-7").unwrap(), Value::Integer(-7));
        assert_eq!(
            Value::parse(ValueKind::Unsigned32, "7").unwrap(),
            Value::Unsigned32(7)
        );
        assert_eq!(
            Value::parse(ValueKind::ObjectIdentifier, "1.3.6.1").unwrap(),
            Value::ObjectIdentifier(oid!(1, 3, 6, 1))
        );
        assert_eq!(Value::parse(ValueKind::OctetString, "x").unwrap(), Value::from("x"));
        assert_eq!(
            Value::parse(ValueKind::Null, "endOfMibView").unwrap(),
            Value::END_OF_MIB_VIEW
        );
        assert!(Value::parse(ValueKind::Integer, "seven").is_err());
        assert!(Value::parse(ValueKind::Null, "nothing").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::OctetString(Bytes::from_static(&[0xff, 0x00])).to_string(), "0xff00");
        assert_eq!(Value::IpAddress([127, 0, 0, 1]).to_string(), "127.0.0.1");
        assert_eq!(Value::Counter64(Uint64::MAX).to_string(), "18446744073709551615");
        assert_eq!(Value::NO_SUCH_INSTANCE.to_string(), "noSuchInstance");
        assert_eq!(Data::new(Value::Integer(3)).to_string(), "Integer: 3");
    }

    #[test]
    fn test_kind_names() {
        for kind in ValueKind::ALL {
            assert_eq!(ValueKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ValueKind::from_name("Gauge"), None);
    }
}
