//! Response shaping: SNMPv1 error mapping and message size limits.

use bytes::Bytes;

use crate::error::{ErrorStatus, Result};
use crate::message::Message;
use crate::pdu::{PduType, StdPdu};
use crate::version::Version;

/// Rewrite a response for an SNMPv1 manager.
///
/// SNMPv1 has no exception values. The first binding carrying one turns the
/// response into `noSuchName` at that index. SNMPv2 error statuses are
/// mapped onto the v1 set (RFC 2576 section 4.4). Any v1 error response
/// echoes the request bindings.
pub(crate) fn shape_v1(request: &StdPdu, response: &mut StdPdu) {
    response.error_status = v1_status(ErrorStatus::from_i32(response.error_status)).as_i32();
    if response.error_status == 0
        && let Some(index) = response.varbinds.iter().position(|vb| vb.value().is_exception())
    {
        response.error_status = ErrorStatus::NoSuchName.as_i32();
        response.error_index = index as i32 + 1;
    }
    if response.error_status != 0 {
        response.varbinds = request.varbinds.clone();
    }
}

fn v1_status(status: ErrorStatus) -> ErrorStatus {
    match status {
        ErrorStatus::WrongValue
        | ErrorStatus::WrongEncoding
        | ErrorStatus::WrongType
        | ErrorStatus::WrongLength
        | ErrorStatus::InconsistentValue => ErrorStatus::BadValue,
        ErrorStatus::NoAccess
        | ErrorStatus::NotWritable
        | ErrorStatus::NoCreation
        | ErrorStatus::InconsistentName
        | ErrorStatus::AuthorizationError => ErrorStatus::NoSuchName,
        ErrorStatus::ResourceUnavailable
        | ErrorStatus::CommitFailed
        | ErrorStatus::UndoFailed
        | ErrorStatus::Unknown(_) => ErrorStatus::GenErr,
        other => other,
    }
}

/// Encode a response, keeping it within `max_size` bytes.
///
/// GetBulk responses drop trailing bindings until they fit. Anything else
/// that does not fit is replaced by a `tooBig` response without bindings.
/// `None` means even that is too large.
pub(crate) fn encode_response(
    version: Version,
    community: Bytes,
    request_type: PduType,
    mut response: StdPdu,
    max_size: usize,
) -> Result<Option<Bytes>> {
    let bytes = Message::new(version, community.clone(), response.clone()).encode()?;
    if bytes.len() <= max_size {
        return Ok(Some(bytes));
    }

    if request_type == PduType::GetBulkRequest && response.error_status == 0 {
        while response.varbinds.pop().is_some() && !response.varbinds.is_empty() {
            let bytes = Message::new(version, community.clone(), response.clone()).encode()?;
            if bytes.len() <= max_size {
                tracing::debug!(
                    target: "async_snmp_agent::agent",
                    { varbinds = response.varbinds.len(), max_size },
                    "truncated GetBulk response"
                );
                return Ok(Some(bytes));
            }
        }
    }

    let too_big = StdPdu {
        error_status: ErrorStatus::TooBig.as_i32(),
        error_index: 0,
        varbinds: Vec::new(),
        ..response
    };
    let bytes = Message::new(version, community, too_big).encode()?;
    Ok((bytes.len() <= max_size).then_some(bytes))
}
