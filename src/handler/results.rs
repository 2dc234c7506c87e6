//! Provider replies.

use crate::error::ErrorStatus;
use crate::oid::Oid;
use crate::pdu::PduType;
use crate::value::Value;
use crate::varbind::VarBind;

use super::ProviderRequest;

/// What a provider produced for one variable binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The binding to place in the response.
    Value(VarBind),
    /// The request failed at this binding.
    Error(ErrorStatus),
    /// No instance here.
    NoValue,
}

impl Reply {
    /// A binding of `oid` to `value`.
    pub fn value(oid: Oid, value: impl Into<Value>) -> Self {
        Reply::Value(VarBind::new(oid, value))
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Reply::Value(_))
    }
}

impl From<VarBind> for Reply {
    fn from(vb: VarBind) -> Self {
        Reply::Value(vb)
    }
}

impl From<ErrorStatus> for Reply {
    fn from(status: ErrorStatus) -> Self {
        Reply::Error(status)
    }
}

impl From<Option<VarBind>> for Reply {
    fn from(vb: Option<VarBind>) -> Self {
        vb.map_or(Reply::NoValue, Reply::Value)
    }
}

/// Answer for a scalar that cannot be written.
///
/// SetRequest is refused with `genErr`, the only status a Set provider may
/// report; anything else gets `value` bound to the scalar's `.0` instance.
pub fn read_only_scalar(req: &ProviderRequest, value: impl Into<Value>) -> Reply {
    if req.op == PduType::SetRequest {
        return Reply::Error(ErrorStatus::GenErr);
    }
    Reply::value(req.node.child(0), value)
}

/// Answer for a writable scalar: `value` bound to the `.0` instance.
///
/// For SetRequest the provider passes the value it has stored.
pub fn writable_scalar(req: &ProviderRequest, value: impl Into<Value>) -> Reply {
    Reply::value(req.node.child(0), value)
}
