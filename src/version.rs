//! SNMP version enumeration.

/// SNMP protocol version.
///
/// Only the community-based versions are represented; an SNMPv3 message is
/// refused while decoding (see [`crate::message::Message::decode`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// SNMPv1 (RFC 1157)
    V1,
    /// SNMPv2c (RFC 1901)
    #[default]
    V2c,
}

/// Version number carried by SNMPv3 messages.
pub const SNMP_V3: i32 = 3;

impl Version {
    /// Get the BER-encoded version number.
    pub const fn as_i32(self) -> i32 {
        match self {
            Version::V1 => 0,
            Version::V2c => 1,
        }
    }

    /// Create from BER-encoded version number.
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Version::V1),
            1 => Some(Version::V2c),
            _ => None,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "SNMPv1"),
            Version::V2c => write!(f, "SNMPv2c"),
        }
    }
}

/// Describe a raw version number as it appears on the wire.
///
/// ```
/// use async_snmp_agent::version::strversion;
///
/// assert_eq!(strversion(0), "v1(0)");
/// assert_eq!(strversion(3), "v3(3)");
/// ```
pub fn strversion(value: i32) -> String {
    match value {
        0 => "v1(0)".to_string(),
        1 => "v2/v2c(1)".to_string(),
        SNMP_V3 => "v3(3)".to_string(),
        other => format!("unknown({})", other),
    }
}
