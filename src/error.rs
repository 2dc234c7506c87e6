//! Error types for async-snmp-agent.
//!
//! All errors are `#[non_exhaustive]` to allow adding new variants without breaking changes.
//!
//! Errors split into two groups. Wire errors ([`Error::Decode`],
//! [`Error::EmptyMessage`], [`Error::NoSupport`]) are produced while parsing
//! datagrams; the agent counts and drops them. Registration errors
//! ([`Error::MalformedOid`], [`Error::ShadowingViolation`],
//! [`Error::TypeConflict`]) are configuration bugs and are returned straight
//! to the caller. [`Error::Timeout`] and [`Error::Snmp`] come from the
//! manager side ([`Client`](crate::client::Client)).

use std::net::SocketAddr;
use std::time::Duration;

use crate::oid::Oid;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Invalid BER length encoding.
    InvalidLength,
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Integer value overflow.
    IntegerOverflow,
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Unsigned integer wider than its type allows.
    IntegerTooLong { length: usize, max: usize },
    /// Long-form length on a type that only admits the short form.
    LongFormLength,
    /// Invalid OID encoding.
    InvalidOidEncoding,
    /// Unknown SNMP version.
    UnknownVersion(i32),
    /// Unknown PDU type.
    UnknownPduType(u8),
    /// Tag has no registered value type.
    UnknownTag(u8),
    /// Constructed OCTET STRING not supported.
    ConstructedOctetString,
    /// Missing required PDU.
    MissingPdu,
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid IP address length.
    InvalidIpAddressLength { length: usize },
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Length exceeds maximum.
    LengthExceedsMax { length: usize, max: usize },
    /// TLV extends past end of data.
    TlvOverflow,
    /// Insufficient data for read.
    InsufficientData { needed: usize, available: usize },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::IntegerTooLong { length, max } => {
                write!(f, "integer is too long: {} bytes, maximum {}", length, max)
            }
            Self::LongFormLength => write!(f, "long-form length not allowed here"),
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {}", v),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type: 0x{:02X}", t),
            Self::UnknownTag(t) => write!(f, "data type for ASN.1 tag 0x{:02X} unknown", t),
            Self::ConstructedOctetString => {
                write!(f, "constructed OCTET STRING (0x24) not supported")
            }
            Self::MissingPdu => write!(f, "missing PDU in message"),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::TlvOverflow => write!(f, "TLV extends past end of data"),
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
        }
    }
}

/// BER encode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeErrorKind {
    /// GetBulk declares more non-repeaters than it carries varbinds.
    NonRepeatersExceedVarbinds { non_repeaters: i32, varbinds: usize },
    /// A v1 trap cannot be sent in an SNMPv2c message.
    TrapVersionMismatch,
}

impl std::fmt::Display for EncodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonRepeatersExceedVarbinds {
                non_repeaters,
                varbinds,
            } => write!(
                f,
                "number of non-repeater varbinds ({}) is greater than the total varbind count ({})",
                non_repeaters, varbinds
            ),
            Self::TrapVersionMismatch => write!(f, "v1 trap PDU requires an SNMPv1 message"),
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Component is not a non-negative decimal integer.
    InvalidArc,
    /// Component exceeds the 32-bit signed maximum.
    ArcTooLarge(u32),
    /// First arc must be 0, 1, or 2.
    InvalidFirstArc(u32),
    /// Second arc must be at most 39.
    InvalidSecondArc { first: u32, second: u32 },
    /// OID too short (minimum 3 arcs).
    TooShort { count: usize },
    /// OID has too many arcs (exceeds MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "component is malformed"),
            Self::ArcTooLarge(v) => {
                write!(f, "component {} exceeds maximum of {}", v, i32::MAX)
            }
            Self::InvalidFirstArc(v) => write!(f, "first arc must be 0, 1, or 2, got {}", v),
            Self::InvalidSecondArc { first, second } => {
                write!(f, "second arc {} too large for first arc {}", second, first)
            }
            Self::TooShort { count } => {
                write!(f, "OID must have at least 3 arcs, got {}", count)
            }
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
        }
    }
}

/// Value range error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeErrorKind {
    /// Numeric value outside the range of its SNMP type.
    ValueOutOfRange { value: i64, type_name: &'static str },
    /// IP address octet outside [0, 255].
    OctetOutOfRange { component: Box<str> },
    /// Hexadecimal literal wider than 64 bits.
    HexTooLarge,
    /// Decimal or octal literal above 2^64 - 1.
    Uint64Overflow,
    /// Error index outside [0, varbind count].
    ErrorIndex { index: i32, varbinds: usize },
    /// Op code outside the PDU tag space.
    PduType(u8),
}

impl std::fmt::Display for RangeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValueOutOfRange { value, type_name } => {
                write!(f, "value {} out of range for {}", value, type_name)
            }
            Self::OctetOutOfRange { component } => {
                write!(f, "component {} is out of range", component)
            }
            Self::HexTooLarge => write!(f, "hex value too large"),
            Self::Uint64Overflow => write!(f, "value exceeds 64 bits"),
            Self::ErrorIndex { index, varbinds } => {
                write!(f, "error index {} is out of range (varbinds: {})", index, varbinds)
            }
            Self::PduType(op) => write!(f, "op {} is out of range", op),
        }
    }
}

/// MIB registration conflict kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowingKind {
    /// An ancestor of the new registration already owns a handler.
    ParentTree,
    /// The node already owns a handler.
    AlreadyRegistered,
    /// The node already has registered descendants.
    HasChildren,
}

impl std::fmt::Display for ShadowingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParentTree => write!(f, "shadowing of parent tree forbidden"),
            Self::AlreadyRegistered => write!(f, "already registered"),
            Self::HasChildren => write!(f, "node has registered descendants"),
        }
    }
}

/// SNMP error status codes (RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// Unknown/future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::NoAccess => write!(f, "noAccess"),
            Self::WrongType => write!(f, "wrongType"),
            Self::WrongLength => write!(f, "wrongLength"),
            Self::WrongEncoding => write!(f, "wrongEncoding"),
            Self::WrongValue => write!(f, "wrongValue"),
            Self::NoCreation => write!(f, "noCreation"),
            Self::InconsistentValue => write!(f, "inconsistentValue"),
            Self::ResourceUnavailable => write!(f, "resourceUnavailable"),
            Self::CommitFailed => write!(f, "commitFailed"),
            Self::UndoFailed => write!(f, "undoFailed"),
            Self::AuthorizationError => write!(f, "authorizationError"),
            Self::NotWritable => write!(f, "notWritable"),
            Self::InconsistentName => write!(f, "inconsistentName"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error on the agent socket.
    #[error("I/O error{}: {source}", target.map(|t| format!(" communicating with {}", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// Object identifier failed canonicalization.
    #[error("malformed OID{}: {kind}", input.as_ref().map(|i| format!(" '{}'", i)).unwrap_or_default())]
    MalformedOid {
        kind: OidErrorKind,
        input: Option<Box<str>>, // Only allocated when parsing string input
    },

    /// BER decoding error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// BER encoding error.
    #[error("encode error: {kind}")]
    Encode { kind: EncodeErrorKind },

    /// Datagram contained no message at all.
    #[error("empty message")]
    EmptyMessage,

    /// Message uses a protocol version this stack refuses to handle.
    #[error("SNMP version {version} is unsupported")]
    NoSupport { version: i32 },

    /// Conflicting registration in the value type registry.
    #[error("type conflict: {reason}")]
    TypeConflict { reason: Box<str> },

    /// MIB registration would place a handler above or below another handler.
    #[error("{oid}: {kind}")]
    ShadowingViolation { oid: Oid, kind: ShadowingKind },

    /// Value outside its declared numeric or structural range.
    #[error("range error: {kind}")]
    Range { kind: RangeErrorKind },

    /// Value has the wrong shape for the requested type.
    #[error("value is of incompatible type: expected {expected}")]
    InvalidValue {
        expected: &'static str,
        input: Option<Box<str>>,
    },

    /// Invalid agent configuration.
    #[error("configuration error: {0}")]
    Config(Box<str>),

    /// Request timed out (after retries if configured).
    #[error("timeout after {elapsed:?}{} (request_id={request_id}, retries={retries})", target.map(|t| format!(" waiting for {}", t)).unwrap_or_default())]
    Timeout {
        target: Option<SocketAddr>,
        elapsed: Duration,
        request_id: i32,
        retries: u32,
    },

    /// Error status returned by the remote entity.
    #[error("SNMP error{}: {status} at index {index}", target.map(|t| format!(" from {}", t)).unwrap_or_default())]
    Snmp {
        target: Option<SocketAddr>,
        status: ErrorStatus,
        index: u32,
        oid: Option<Oid>,
    },
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create an encode error.
    pub fn encode(kind: EncodeErrorKind) -> Self {
        Self::Encode { kind }
    }

    /// Create a malformed OID error from a kind (no input string).
    pub fn malformed_oid(kind: OidErrorKind) -> Self {
        Self::MalformedOid { kind, input: None }
    }

    /// Create a malformed OID error with the input string that failed.
    pub fn malformed_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::MalformedOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Create a range error.
    pub fn range(kind: RangeErrorKind) -> Self {
        Self::Range { kind }
    }

    /// Create an incompatible-value error.
    pub fn invalid_value(expected: &'static str, input: impl Into<Box<str>>) -> Self {
        Self::InvalidValue {
            expected,
            input: Some(input.into()),
        }
    }

    /// Create a type registry conflict.
    pub fn type_conflict(reason: impl Into<Box<str>>) -> Self {
        Self::TypeConflict {
            reason: reason.into(),
        }
    }

    /// Whether this error came from parsing wire bytes.
    ///
    /// The agent drops (and counts) datagrams that fail with one of these.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::EmptyMessage
                | Self::NoSupport { .. }
                | Self::MalformedOid { .. }
                | Self::InvalidValue { .. }
        )
    }

    /// Get the target address if this error has one.
    pub fn target(&self) -> Option<SocketAddr> {
        match self {
            Self::Io { target, .. } => *target,
            Self::Timeout { target, .. } => *target,
            Self::Snmp { target, .. } => *target,
            _ => None,
        }
    }
}
