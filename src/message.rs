//! Community-based SNMP message format (v1/v2c).
//!
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`
//!
//! SNMPv3 shares the outer SEQUENCE and version field but nothing after it;
//! such messages are recognized and refused with [`Error::NoSupport`].

use std::net::SocketAddr;

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, Result};
use crate::pdu::{Pdu, StdPdu};
use crate::value::{TypeRegistry, default_registry};
use crate::version::{SNMP_V3, Version};

/// SNMP v1/v2c message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: Version,
    /// Community string for authentication.
    pub community: Bytes,
    pub pdu: Pdu,
}

impl Message {
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: impl Into<Pdu>) -> Self {
        Self {
            version,
            community: community.into(),
            pdu: pdu.into(),
        }
    }

    /// Create a V1 message.
    pub fn v1(community: impl Into<Bytes>, pdu: impl Into<Pdu>) -> Self {
        Self::new(Version::V1, community, pdu)
    }

    /// Create a V2c message.
    pub fn v2c(community: impl Into<Bytes>, pdu: impl Into<Pdu>) -> Self {
        Self::new(Version::V2c, community, pdu)
    }

    /// The PDU, if it has the request-id/error layout.
    pub fn std_pdu(&self) -> Option<&StdPdu> {
        match &self.pdu {
            Pdu::Std(pdu) => Some(pdu),
            Pdu::TrapV1(_) => None,
        }
    }

    /// Encode to BER.
    ///
    /// A v1 Trap PDU can only travel in an SNMPv1 message.
    pub fn encode(&self) -> Result<Bytes> {
        if matches!(self.pdu, Pdu::TrapV1(_)) && self.version != Version::V1 {
            return Err(Error::encode(EncodeErrorKind::TrapVersionMismatch));
        }

        let mut buf = EncodeBuf::new();
        let mut result = Ok(());
        buf.push_sequence(|buf| {
            result = self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
        });
        result?;

        Ok(buf.finish())
    }

    /// Decode from BER using the default type registry.
    pub fn decode(data: Bytes) -> Result<Self> {
        Self::decode_with(default_registry(), data)
    }

    /// Decode from BER, resolving value tags through `registry`.
    pub fn decode_with(registry: &TypeRegistry, data: Bytes) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;

        let version_at = seq.offset();
        let version_num = seq.read_integer()?;
        let version = match Version::from_i32(version_num) {
            Some(v) => v,
            None if version_num == SNMP_V3 => {
                return Err(Error::NoSupport {
                    version: version_num,
                });
            }
            None => {
                return Err(Error::decode(
                    version_at,
                    DecodeErrorKind::UnknownVersion(version_num),
                ));
            }
        };

        let community = seq.read_octet_string()?;
        if seq.is_empty() {
            return Err(Error::decode(seq.offset(), DecodeErrorKind::MissingPdu));
        }
        let pdu = Pdu::decode(registry, &mut seq)?;

        if !decoder.is_empty() {
            tracing::debug!(
                target: "async_snmp_agent::ber",
                { snmp.offset = decoder.offset(), trailing = decoder.remaining() },
                "ignoring trailing bytes after message"
            );
        }

        Ok(Message {
            version,
            community,
            pdu,
        })
    }
}

/// A datagram as received from the transport.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub bytes: Bytes,
    pub source: SocketAddr,
}

/// A datagram to hand to the transport.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub bytes: Bytes,
    pub destination: SocketAddr,
}
