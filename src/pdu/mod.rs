//! SNMP Protocol Data Units (PDUs).
//!
//! Two shapes exist on the wire. [`StdPdu`] covers every operation that
//! carries a request-id and the error-status/error-index pair (GetBulk reuses
//! those two slots for non-repeaters and max-repetitions). [`TrapV1Pdu`] is the
//! SNMPv1 trap with its own field layout.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, EncodeErrorKind, Error, ErrorStatus, RangeErrorKind, Result};
use crate::oid::Oid;
use crate::value::TypeRegistry;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// PDU operation.
///
/// The discriminant is the op code carried in the low bits of the
/// context-constructed PDU tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PduType {
    GetRequest = 0,
    GetNextRequest = 1,
    Response = 2,
    SetRequest = 3,
    Trap = 4,
    GetBulkRequest = 5,
    InformRequest = 6,
    SnmpV2Trap = 7,
    Report = 8,
}

impl PduType {
    /// Create from an op code.
    pub fn from_op(op: u8) -> Option<Self> {
        match op {
            0 => Some(Self::GetRequest),
            1 => Some(Self::GetNextRequest),
            2 => Some(Self::Response),
            3 => Some(Self::SetRequest),
            4 => Some(Self::Trap),
            5 => Some(Self::GetBulkRequest),
            6 => Some(Self::InformRequest),
            7 => Some(Self::SnmpV2Trap),
            8 => Some(Self::Report),
            _ => None,
        }
    }

    /// Create from a PDU tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        if !tag::is_pdu_tag(tag) {
            return None;
        }
        Self::from_op(tag::tag_number(tag))
    }

    /// The op code.
    pub fn op(self) -> u8 {
        self as u8
    }

    /// The tag byte this PDU is wrapped in.
    pub fn tag(self) -> u8 {
        tag::pdu_tag(self.op())
    }

    /// Whether an agent answers this operation.
    pub fn is_request(self) -> bool {
        matches!(
            self,
            Self::GetRequest | Self::GetNextRequest | Self::SetRequest | Self::GetBulkRequest
        )
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GetRequest => "GetRequest",
            Self::GetNextRequest => "GetNextRequest",
            Self::Response => "Response",
            Self::SetRequest => "SetRequest",
            Self::Trap => "Trap",
            Self::GetBulkRequest => "GetBulkRequest",
            Self::InformRequest => "InformRequest",
            Self::SnmpV2Trap => "SNMPv2-Trap",
            Self::Report => "Report",
        };
        write!(f, "{}({})", name, self.op())
    }
}

/// SNMPv1 generic trap codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum GenericTrap {
    ColdStart = 0,
    WarmStart = 1,
    LinkDown = 2,
    LinkUp = 3,
    AuthenticationFailure = 4,
    EgpNeighborLoss = 5,
    EnterpriseSpecific = 6,
}

impl GenericTrap {
    /// Create from the wire integer.
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::ColdStart),
            1 => Some(Self::WarmStart),
            2 => Some(Self::LinkDown),
            3 => Some(Self::LinkUp),
            4 => Some(Self::AuthenticationFailure),
            5 => Some(Self::EgpNeighborLoss),
            6 => Some(Self::EnterpriseSpecific),
            _ => None,
        }
    }

    /// The wire integer.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for GenericTrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ColdStart => "coldStart",
            Self::WarmStart => "warmStart",
            Self::LinkDown => "linkDown",
            Self::LinkUp => "linkUp",
            Self::AuthenticationFailure => "authenticationFailure",
            Self::EgpNeighborLoss => "egpNeighborLoss",
            Self::EnterpriseSpecific => "enterpriseSpecific",
        };
        write!(f, "{}({})", name, self.as_i32())
    }
}

/// PDU with request-id and error fields.
///
/// For `GetBulkRequest` the `error_status` slot holds non-repeaters and the
/// `error_index` slot holds max-repetitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdPdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: i32,
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl StdPdu {
    /// Create a PDU with cleared error fields.
    pub fn new(pdu_type: PduType, request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Create a GetBulk request.
    pub fn get_bulk(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        varbinds: Vec<VarBind>,
    ) -> Self {
        Self {
            pdu_type: PduType::GetBulkRequest,
            request_id,
            error_status: non_repeaters,
            error_index: max_repetitions,
            varbinds,
        }
    }

    /// GetBulk non-repeaters (the error-status slot).
    pub fn non_repeaters(&self) -> i32 {
        self.error_status
    }

    /// GetBulk max-repetitions (the error-index slot).
    pub fn max_repetitions(&self) -> i32 {
        self.error_index
    }

    /// The error-status slot as an enum.
    pub fn error_status(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// Set the error status and the 1-based index it refers to.
    ///
    /// The index must lie in `[0, varbinds.len()]`.
    pub fn set_error(&mut self, status: ErrorStatus, index: i32) -> Result<()> {
        if index < 0 || index as usize > self.varbinds.len() {
            return Err(Error::range(RangeErrorKind::ErrorIndex {
                index,
                varbinds: self.varbinds.len(),
            }));
        }
        self.error_status = status.as_i32();
        self.error_index = index;
        Ok(())
    }

    /// Copy of this PDU under a different op.
    pub fn clone_as(&self, pdu_type: PduType) -> Self {
        Self {
            pdu_type,
            ..self.clone()
        }
    }

    /// Response shell: same request-id and varbinds, error fields cleared.
    pub fn to_response(&self) -> Self {
        Self::new(PduType::Response, self.request_id, self.varbinds.clone())
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        if self.pdu_type == PduType::GetBulkRequest
            && self.non_repeaters() > 0
            && self.non_repeaters() as usize > self.varbinds.len()
        {
            return Err(Error::encode(EncodeErrorKind::NonRepeatersExceedVarbinds {
                non_repeaters: self.non_repeaters(),
                varbinds: self.varbinds.len(),
            }));
        }

        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
        Ok(())
    }

    fn decode_body(pdu_type: PduType, registry: &TypeRegistry, body: &mut Decoder) -> Result<Self> {
        let request_id = body.read_integer()?;
        let error_status = body.read_integer()?;
        let error_index = body.read_integer()?;
        let varbinds = decode_varbind_list(registry, body)?;

        Ok(Self {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}

/// SNMPv1 Trap PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapV1Pdu {
    /// sysObjectID of the sender.
    pub enterprise: Oid,
    pub agent_addr: [u8; 4],
    pub generic_trap: i32,
    /// Meaningful only for `enterpriseSpecific`.
    pub specific_trap: i32,
    /// sysUpTime in hundredths of a second.
    pub time_stamp: u32,
    pub varbinds: Vec<VarBind>,
}

impl TrapV1Pdu {
    pub fn new(
        enterprise: Oid,
        agent_addr: [u8; 4],
        generic_trap: GenericTrap,
        specific_trap: i32,
        time_stamp: u32,
        varbinds: Vec<VarBind>,
    ) -> Self {
        Self {
            enterprise,
            agent_addr,
            generic_trap: generic_trap.as_i32(),
            specific_trap,
            time_stamp,
            varbinds,
        }
    }

    /// The generic trap code, if it is one of the seven defined values.
    pub fn generic(&self) -> Option<GenericTrap> {
        GenericTrap::from_i32(self.generic_trap)
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(PduType::Trap.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_unsigned32(tag::application::TIMETICKS, self.time_stamp);
            buf.push_integer(self.specific_trap);
            buf.push_integer(self.generic_trap);
            buf.push_ip_address(self.agent_addr);
            buf.push_oid(&self.enterprise);
        });
    }

    fn decode_body(registry: &TypeRegistry, body: &mut Decoder) -> Result<Self> {
        let enterprise = body.read_oid()?;
        enterprise.validate_canonical()?;
        let agent_addr = body.read_ip_address()?;
        let generic_trap = body.read_integer()?;
        let specific_trap = body.read_integer()?;
        let len = body.expect_tag(tag::application::TIMETICKS)?;
        let time_stamp = body.read_unsigned32_value(len)?;
        let varbinds = decode_varbind_list(registry, body)?;

        Ok(Self {
            enterprise,
            agent_addr,
            generic_trap,
            specific_trap,
            time_stamp,
            varbinds,
        })
    }
}

/// Any PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pdu {
    Std(StdPdu),
    TrapV1(TrapV1Pdu),
}

impl Pdu {
    /// The operation.
    pub fn pdu_type(&self) -> PduType {
        match self {
            Pdu::Std(pdu) => pdu.pdu_type,
            Pdu::TrapV1(_) => PduType::Trap,
        }
    }

    /// The variable bindings.
    pub fn varbinds(&self) -> &[VarBind] {
        match self {
            Pdu::Std(pdu) => &pdu.varbinds,
            Pdu::TrapV1(pdu) => &pdu.varbinds,
        }
    }

    /// Replace the variable bindings.
    pub fn set_varbinds(&mut self, varbinds: Vec<VarBind>) {
        match self {
            Pdu::Std(pdu) => pdu.varbinds = varbinds,
            Pdu::TrapV1(pdu) => pdu.varbinds = varbinds,
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        match self {
            Pdu::Std(pdu) => pdu.encode(buf),
            Pdu::TrapV1(pdu) => {
                pdu.encode(buf);
                Ok(())
            }
        }
    }

    /// Decode a PDU, choosing the shape from its tag.
    pub fn decode(registry: &TypeRegistry, decoder: &mut Decoder) -> Result<Self> {
        let start = decoder.offset();
        let tag = decoder.read_tag()?;
        let pdu_type = PduType::from_tag(tag)
            .ok_or_else(|| Error::decode(start, DecodeErrorKind::UnknownPduType(tag)))?;

        let len = decoder.read_length()?;
        let mut body = decoder.sub_decoder(len)?;

        let pdu = match pdu_type {
            PduType::Trap => Pdu::TrapV1(TrapV1Pdu::decode_body(registry, &mut body)?),
            other => Pdu::Std(StdPdu::decode_body(other, registry, &mut body)?),
        };

        if !body.is_empty() {
            tracing::debug!(
                target: "async_snmp_agent::ber",
                { snmp.offset = body.offset(), trailing = body.remaining() },
                "ignoring trailing bytes in PDU"
            );
        }
        Ok(pdu)
    }
}

impl From<StdPdu> for Pdu {
    fn from(pdu: StdPdu) -> Self {
        Pdu::Std(pdu)
    }
}

impl From<TrapV1Pdu> for Pdu {
    fn from(pdu: TrapV1Pdu) -> Self {
        Pdu::TrapV1(pdu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::{Value, default_registry};

    fn encode(pdu: &Pdu) -> bytes::Bytes {
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf).unwrap();
        buf.finish()
    }

    fn decode(bytes: bytes::Bytes) -> Result<Pdu> {
        Pdu::decode(default_registry(), &mut Decoder::new(bytes))
    }

    #[test]
    fn test_pdu_type_tags() {
        assert_eq!(PduType::GetRequest.tag(), 0xA0);
        assert_eq!(PduType::Report.tag(), 0xA8);
        assert_eq!(PduType::from_tag(0xA5), Some(PduType::GetBulkRequest));
        assert_eq!(PduType::from_tag(0xA9), None);
        assert_eq!(PduType::from_tag(0x05), None);
        assert_eq!(PduType::from_op(9), None);
    }

    #[test]
    fn test_pdu_type_display() {
        assert_eq!(PduType::GetNextRequest.to_string(), "GetNextRequest(1)");
        assert_eq!(PduType::SnmpV2Trap.to_string(), "SNMPv2-Trap(7)");
        assert_eq!(GenericTrap::LinkUp.to_string(), "linkUp(3)");
    }

    #[test]
    fn test_is_request() {
        assert!(PduType::GetBulkRequest.is_request());
        assert!(PduType::SetRequest.is_request());
        assert!(!PduType::Response.is_request());
        assert!(!PduType::InformRequest.is_request());
        assert!(!PduType::Trap.is_request());
    }

    #[test]
    fn test_get_request_bytes() {
        let pdu = Pdu::Std(StdPdu::new(
            PduType::GetRequest,
            1,
            vec![VarBind::null(oid!(1, 3, 6, 1))],
        ));
        assert_eq!(
            &encode(&pdu)[..],
            &[
                0xA0, 0x14, 0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x09,
                0x30, 0x07, 0x06, 0x03, 0x2b, 0x06, 0x01, 0x05, 0x00
            ][..]
        );
    }

    #[test]
    fn test_std_roundtrip() {
        let mut pdu = StdPdu::new(
            PduType::Response,
            0x1234,
            vec![
                VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), "router"),
                VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(100)),
            ],
        );
        pdu.set_error(ErrorStatus::NoSuchName, 2).unwrap();

        let decoded = decode(encode(&Pdu::Std(pdu.clone()))).unwrap();
        assert_eq!(decoded, Pdu::Std(pdu));
    }

    #[test]
    fn test_set_error_range() {
        let mut pdu = StdPdu::new(PduType::Response, 1, vec![VarBind::null(oid!(1, 3, 6))]);
        assert!(pdu.set_error(ErrorStatus::GenErr, 1).is_ok());
        assert!(pdu.set_error(ErrorStatus::GenErr, 0).is_ok());
        assert!(matches!(
            pdu.set_error(ErrorStatus::GenErr, 2),
            Err(Error::Range { .. })
        ));
        assert!(pdu.set_error(ErrorStatus::GenErr, -1).is_err());
    }

    #[test]
    fn test_get_bulk_fields() {
        let pdu = StdPdu::get_bulk(7, 1, 10, vec![VarBind::null(oid!(1, 3, 6))]);
        assert_eq!(pdu.non_repeaters(), 1);
        assert_eq!(pdu.max_repetitions(), 10);

        let decoded = decode(encode(&Pdu::Std(pdu.clone()))).unwrap();
        assert_eq!(decoded, Pdu::Std(pdu));
    }

    #[test]
    fn test_get_bulk_too_many_non_repeaters() {
        let pdu = StdPdu::get_bulk(7, 2, 10, vec![VarBind::null(oid!(1, 3, 6))]);
        let mut buf = EncodeBuf::new();
        assert!(matches!(
            pdu.encode(&mut buf),
            Err(Error::Encode {
                kind: EncodeErrorKind::NonRepeatersExceedVarbinds { .. }
            })
        ));
    }

    #[test]
    fn test_clone_as() {
        let mut req = StdPdu::new(PduType::GetRequest, 99, vec![VarBind::null(oid!(1, 3, 6, 1))]);
        req.error_status = 3;
        let resp = req.clone_as(PduType::Response);
        assert_eq!(resp.pdu_type, PduType::Response);
        assert_eq!(resp.request_id, 99);
        assert_eq!(resp.error_status, 3);
        assert_eq!(resp.varbinds, req.varbinds);

        let shell = req.to_response();
        assert_eq!(shell.error_status, 0);
        assert_eq!(shell.varbinds, req.varbinds);
    }

    #[test]
    fn test_trap_v1_roundtrip() {
        let trap = TrapV1Pdu::new(
            oid!(1, 3, 6, 1, 4, 1, 9999),
            [192, 168, 1, 1],
            GenericTrap::EnterpriseSpecific,
            42,
            12345,
            vec![VarBind::new(oid!(1, 3, 6, 1, 4, 1, 9999, 1), Value::Integer(5))],
        );
        let decoded = decode(encode(&Pdu::TrapV1(trap.clone()))).unwrap();
        assert_eq!(decoded.pdu_type(), PduType::Trap);
        assert_eq!(decoded, Pdu::TrapV1(trap));
    }

    #[test]
    fn test_unknown_pdu_tag() {
        let bytes = bytes::Bytes::from_static(&[0xA9, 0x00]);
        assert!(matches!(
            decode(bytes),
            Err(Error::Decode {
                offset: 0,
                kind: DecodeErrorKind::UnknownPduType(0xA9)
            })
        ));
    }
}
