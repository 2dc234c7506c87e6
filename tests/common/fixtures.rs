//! Common test fixtures and constants.

use std::sync::{Arc, Mutex};

use async_snmp_agent::handler::{
    Registration, Reply, RowTable, provider_fn, read_only_scalar, writable_scalar,
};
use async_snmp_agent::{Agent, AgentBuilder, ErrorStatus, Oid, PduType, Value, oid};

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_object_id() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)
}
pub fn sys_contact() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}

// =============================================================================
// Subtree roots (for walks)
// =============================================================================

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// Interfaces subtree root: 1.3.6.1.2.1.2
pub fn interfaces_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2)
}

/// ifEntry: 1.3.6.1.2.1.2.2.1
pub fn if_entry() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1)
}

/// Nonexistent OID for testing noSuchObject
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

/// Read community
pub const COMMUNITY_RO: &[u8] = b"public";
/// Read-write community
pub const COMMUNITY_RW: &[u8] = b"private";

pub const SYS_DESCR: &str = "async-snmp-agent test agent";

// =============================================================================
// Agent fixtures
// =============================================================================

/// sysDescr, sysObjectID, sysContact (writable), sysName (writable) and an
/// ifTable with ifIndex/ifDescr for interfaces 1, 2 and 10.
pub fn test_registrations() -> Vec<Registration> {
    let mut rows = RowTable::new();
    for (index, name) in [(1, "lo"), (2, "eth0"), (10, "wlan0")] {
        rows.insert(&[index], (index as i32, name));
    }
    let rows = Arc::new(rows);

    vec![
        Registration::scalar(
            "1.3.6.1.2.1.1.1",
            provider_fn(|req| read_only_scalar(req, SYS_DESCR)),
        )
        .unwrap(),
        Registration::scalar(
            "1.3.6.1.2.1.1.2",
            provider_fn(|req| read_only_scalar(req, oid!(1, 3, 6, 1, 4, 1, 99999))),
        )
        .unwrap(),
        writable_string("1.3.6.1.2.1.1.4", "admin@example.com"),
        writable_string("1.3.6.1.2.1.1.5", "test-host"),
        Registration::table(
            "1.3.6.1.2.1.2.2.1",
            [1, 2],
            provider_fn(move |req| {
                let column = req.node.arcs().last().copied();
                rows.reply(req, |&(index, name)| match column {
                    Some(1) => Value::Integer(index),
                    _ => Value::from(name),
                })
            }),
        )
        .unwrap(),
    ]
}

/// A DisplayString scalar that accepts OCTET STRING values.
pub fn writable_string(oid: &str, initial: &str) -> Registration {
    let current = Mutex::new(Value::from(initial));
    Registration::scalar(
        oid,
        provider_fn(move |req| {
            let mut current = current.lock().unwrap();
            if req.op == PduType::SetRequest {
                match req.value.as_ref().map(|d| d.value()) {
                    Some(v @ Value::OctetString(_)) => *current = v.clone(),
                    _ => return Reply::Error(ErrorStatus::WrongType),
                }
            }
            writable_scalar(req, current.clone())
        }),
    )
    .unwrap()
}

/// Agent on an ephemeral loopback port serving [`test_registrations`].
pub async fn test_agent(builder: AgentBuilder) -> Agent {
    builder
        .bind("127.0.0.1:0")
        .recv_buffer_size(None)
        .providers(test_registrations())
        .build()
        .await
        .unwrap()
}
