//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with a tagged value.

use crate::ber::{Decoder, EncodeBuf};
use crate::error::Result;
use crate::oid::Oid;
use crate::value::{Data, TypeRegistry, Value};

/// Variable binding - an OID-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value and the tag it is encoded under.
    pub data: Data,
}

impl VarBind {
    /// Create a new VarBind with the value under its default tag.
    pub fn new(oid: Oid, value: impl Into<Value>) -> Self {
        Self {
            oid,
            data: Data::new(value.into()),
        }
    }

    /// Create a VarBind carrying an already-tagged value.
    pub fn with_data(oid: Oid, data: Data) -> Self {
        Self { oid, data }
    }

    /// Create a VarBind from a dotted OID string, canonicalizing it.
    pub fn parse(oid: &str, value: impl Into<Value>) -> Result<Self> {
        Ok(Self::new(Oid::canonicalize(oid)?, value))
    }

    /// Create a VarBind with a NULL value (request placeholder).
    pub fn null(oid: Oid) -> Self {
        Self::new(oid, Value::NULL)
    }

    /// The typed value.
    pub fn value(&self) -> &Value {
        self.data.value()
    }

    /// Replace the OID from a dotted string, canonicalizing it.
    pub fn set_oid_str(&mut self, oid: &str) -> Result<()> {
        self.oid = Oid::canonicalize(oid)?;
        Ok(())
    }

    /// Replace the value, resetting the tag to the value's default.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.data = Data::new(value.into());
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.data.encode(buf);
            buf.push_oid(&self.oid);
        });
    }

    /// Decode from BER.
    ///
    /// The name must be a canonical OID; the value's kind comes from `registry`.
    pub fn decode(registry: &TypeRegistry, decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;
        let oid = seq.read_oid()?;
        oid.validate_canonical()?;
        let data = Data::decode_with(registry, &mut seq)?;
        Ok(VarBind { oid, data })
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.data)
    }
}

/// Encode a list of VarBinds.
pub fn encode_varbind_list(buf: &mut EncodeBuf, varbinds: &[VarBind]) {
    buf.push_sequence(|buf| {
        // reverse buffer
        for vb in varbinds.iter().rev() {
            vb.encode(buf);
        }
    });
}

/// Decode a list of VarBinds.
pub fn decode_varbind_list(registry: &TypeRegistry, decoder: &mut Decoder) -> Result<Vec<VarBind>> {
    let mut seq = decoder.read_sequence()?;
    let mut varbinds = Vec::new();

    while !seq.is_empty() {
        varbinds.push(VarBind::decode(registry, &mut seq)?);
    }

    Ok(varbinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::oid;
    use crate::value::default_registry;

    fn roundtrip(vb: &VarBind) -> VarBind {
        let mut buf = EncodeBuf::new();
        vb.encode(&mut buf);
        let mut decoder = Decoder::new(buf.finish());
        VarBind::decode(default_registry(), &mut decoder).unwrap()
    }

    #[test]
    fn test_varbind_roundtrip() {
        let vb = VarBind::new(oid!(1, 3, 6, 1), Value::Integer(42));
        assert_eq!(roundtrip(&vb), vb);
    }

    #[test]
    fn test_varbind_exception_values() {
        for marker in [Value::NO_SUCH_OBJECT, Value::NO_SUCH_INSTANCE, Value::END_OF_MIB_VIEW] {
            let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), marker);
            let decoded = roundtrip(&vb);
            assert_eq!(decoded, vb);
            assert!(decoded.value().is_exception());
        }
    }

    #[test]
    fn test_varbind_list_roundtrip() {
        let varbinds = vec![
            VarBind::new(oid!(1, 3, 6, 1), Value::Integer(1)),
            VarBind::new(oid!(1, 3, 6, 2), Value::from("two")),
        ];

        let mut buf = EncodeBuf::new();
        encode_varbind_list(&mut buf, &varbinds);
        let mut decoder = Decoder::new(buf.finish());
        let decoded = decode_varbind_list(default_registry(), &mut decoder).unwrap();

        assert_eq!(varbinds, decoded);
    }

    #[test]
    fn test_varbind_list_empty() {
        let mut buf = EncodeBuf::new();
        encode_varbind_list(&mut buf, &[]);
        let bytes = buf.finish();
        assert_eq!(&bytes[..], &[0x30, 0x00]);

        let decoded = decode_varbind_list(default_registry(), &mut Decoder::new(bytes)).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_varbind_name_must_be_canonical() {
        // SEQUENCE { OID 1.3, NULL }
        let bytes = [0x30, 0x05, 0x06, 0x01, 0x2b, 0x05, 0x00];
        let err = VarBind::decode(default_registry(), &mut Decoder::from_slice(&bytes));
        assert!(matches!(err, Err(Error::MalformedOid { .. })));
    }

    #[test]
    fn test_setters() {
        let mut vb = VarBind::parse(".1.3.6.1.2.1.1.5.0", "host").unwrap();
        assert_eq!(vb.oid, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0));
        vb.set_value(Value::TimeTicks(5));
        assert_eq!(vb.value(), &Value::TimeTicks(5));
        assert!(vb.set_oid_str("9.9.9").is_err());
        vb.set_oid_str("1.3.6.1.2.1.1.3.0").unwrap();
        assert_eq!(vb.to_string(), "1.3.6.1.2.1.1.3.0 = TimeTicks: 5");
    }
}
