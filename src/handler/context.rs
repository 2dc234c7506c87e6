//! Request context for providers.

use std::net::SocketAddr;

use bytes::Bytes;

use crate::mib::NodeKind;
use crate::oid::Oid;
use crate::pdu::PduType;
use crate::value::Data;
use crate::version::Version;

/// One variable binding as seen by a provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Operation of the enclosing PDU. GetBulk repetitions arrive as
    /// `GetBulkRequest` but behave like GetNext.
    pub op: PduType,
    /// Source address of the request.
    pub source: SocketAddr,
    pub version: Version,
    /// Community string the request carried.
    pub community: Bytes,
    /// Request ID from the PDU.
    pub request_id: i32,
    /// The OID being resolved.
    pub oid: Oid,
    /// OID of the object the request was routed to.
    pub node: Oid,
    /// Kind of that object (Scalar or Column).
    pub node_kind: NodeKind,
    /// Value to store, for SetRequest.
    pub value: Option<Data>,
}

impl ProviderRequest {
    /// Arcs of [`oid`](Self::oid) below the node, when the node is a strict
    /// ancestor of the requested OID.
    ///
    /// For a Get or Set on a column this is the row index. For a GetNext it
    /// is the row to continue after, or `None` to start at the first row.
    pub fn instance(&self) -> Option<&[u32]> {
        self.oid
            .suffix_after(&self.node)
            .filter(|suffix| !suffix.is_empty())
    }

    /// Whether the enclosing operation walks forward (GetNext or GetBulk).
    pub fn is_next(&self) -> bool {
        matches!(self.op, PduType::GetNextRequest | PduType::GetBulkRequest)
    }

    /// OID of a row in this request's column.
    pub fn row_oid(&self, index: &[u32]) -> Oid {
        self.node.join(index)
    }
}
