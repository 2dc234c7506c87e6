//! SNMP notification receiver (traps and informs).
//!
//! Accepts the three v1/v2c notification forms:
//! - Trap (SNMPv1, its own PDU layout)
//! - SNMPv2-Trap (unconfirmed)
//! - InformRequest (confirmed; a Response is sent back before it is returned)
//!
//! # Example
//!
//! ```rust,no_run
//! use async_snmp_agent::notification::NotificationReceiver;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> async_snmp_agent::Result<()> {
//!     let receiver = NotificationReceiver::builder()
//!         .bind("0.0.0.0:1162")
//!         .community(b"public")
//!         .build()
//!         .await?;
//!
//!     loop {
//!         let (notification, source) = receiver.recv().await?;
//!         println!("{} from {}: {:?}", notification.trap_oid(), source, notification.varbinds());
//!     }
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tracing::instrument;

use crate::error::{DecodeErrorKind, Error, Result};
use crate::message::Message;
use crate::oid::Oid;
use crate::pdu::{GenericTrap, Pdu, PduType, StdPdu, TrapV1Pdu};
use crate::transport::AgentTransport;
use crate::util::bind_udp_socket;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// Well-known OIDs for notification varbinds.
pub mod oids {
    use crate::oid;

    /// sysUpTime.0, first varbind of every v2c notification
    pub fn sys_uptime() -> crate::Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
    }

    /// snmpTrapOID.0, second varbind of every v2c notification
    pub fn snmp_trap_oid() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0)
    }

    /// snmpTrapEnterprise.0
    pub fn snmp_trap_enterprise() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 3, 0)
    }

    /// snmpTraps, the prefix of the generic trap OIDs
    pub fn snmp_traps() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5)
    }

    /// coldStart (snmpTraps.1)
    pub fn cold_start() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1)
    }

    /// warmStart (snmpTraps.2)
    pub fn warm_start() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 2)
    }

    /// linkDown (snmpTraps.3)
    pub fn link_down() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3)
    }

    /// linkUp (snmpTraps.4)
    pub fn link_up() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 4)
    }

    /// authenticationFailure (snmpTraps.5)
    pub fn auth_failure() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 5)
    }

    /// egpNeighborLoss (snmpTraps.6)
    pub fn egp_neighbor_loss() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 6)
    }
}

/// Varbinds of a v2c notification: sysUpTime.0 and snmpTrapOID.0, then `rest`.
pub fn notification_varbinds(uptime: u32, trap_oid: &Oid, rest: Vec<VarBind>) -> Vec<VarBind> {
    let mut varbinds = Vec::with_capacity(rest.len() + 2);
    varbinds.push(VarBind::new(oids::sys_uptime(), Value::TimeTicks(uptime)));
    varbinds.push(VarBind::new(oids::snmp_trap_oid(), trap_oid.clone()));
    varbinds.extend(rest);
    varbinds
}

/// Split a v2c notification into uptime, trap OID and the remaining varbinds.
///
/// Only the value types of the first two bindings are checked, not their
/// OIDs; some senders get those wrong.
fn split_notification_varbinds(pdu: &StdPdu) -> Result<(u32, Oid, Vec<VarBind>)> {
    let (uptime, trap_oid) = match pdu.varbinds.as_slice() {
        [first, second, ..] => (first.value(), second.value()),
        _ => return Err(Error::decode(0, DecodeErrorKind::MissingPdu)),
    };
    let uptime = match uptime {
        Value::TimeTicks(t) => *t,
        _ => {
            tracing::debug!(target: "async_snmp_agent::notification", { snmp.request_id = pdu.request_id }, "first varbind is not TimeTicks");
            return Err(Error::invalid_value("TimeTicks", uptime.to_string()));
        }
    };
    let trap_oid = match trap_oid {
        Value::ObjectIdentifier(oid) => oid.clone(),
        _ => {
            tracing::debug!(target: "async_snmp_agent::notification", { snmp.request_id = pdu.request_id }, "second varbind is not an OID");
            return Err(Error::invalid_value("ObjectIdentifier", trap_oid.to_string()));
        }
    };
    Ok((uptime, trap_oid, pdu.varbinds[2..].to_vec()))
}

/// A received notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// SNMPv1 Trap.
    TrapV1 {
        community: Bytes,
        trap: TrapV1Pdu,
    },

    /// SNMPv2c Trap (unconfirmed).
    TrapV2c {
        community: Bytes,
        /// sysUpTime.0 value (hundredths of a second)
        uptime: u32,
        /// snmpTrapOID.0 value
        trap_oid: Oid,
        /// Bindings after the first two
        varbinds: Vec<VarBind>,
        request_id: i32,
    },

    /// InformRequest (confirmed). The Response has already been sent.
    InformV2c {
        community: Bytes,
        uptime: u32,
        trap_oid: Oid,
        varbinds: Vec<VarBind>,
        request_id: i32,
    },
}

impl Notification {
    /// The notification OID.
    ///
    /// For a v1 Trap this is the OID RFC 3584 maps it to: a generic trap
    /// becomes `snmpTraps.(generic + 1)`, an enterprise-specific one
    /// `enterprise.0.specific`.
    pub fn trap_oid(&self) -> Oid {
        match self {
            Notification::TrapV1 { trap, .. } => match trap.generic() {
                Some(GenericTrap::EnterpriseSpecific) | None => {
                    trap.enterprise.join(&[0, trap.specific_trap.max(0) as u32])
                }
                Some(generic) => oids::snmp_traps().child(generic.as_i32() as u32 + 1),
            },
            Notification::TrapV2c { trap_oid, .. } | Notification::InformV2c { trap_oid, .. } => {
                trap_oid.clone()
            }
        }
    }

    /// sysUpTime.0, or the time stamp of a v1 Trap.
    pub fn uptime(&self) -> u32 {
        match self {
            Notification::TrapV1 { trap, .. } => trap.time_stamp,
            Notification::TrapV2c { uptime, .. } | Notification::InformV2c { uptime, .. } => *uptime,
        }
    }

    /// The notification-specific bindings.
    pub fn varbinds(&self) -> &[VarBind] {
        match self {
            Notification::TrapV1 { trap, .. } => &trap.varbinds,
            Notification::TrapV2c { varbinds, .. } | Notification::InformV2c { varbinds, .. } => {
                varbinds
            }
        }
    }

    pub fn community(&self) -> &Bytes {
        match self {
            Notification::TrapV1 { community, .. }
            | Notification::TrapV2c { community, .. }
            | Notification::InformV2c { community, .. } => community,
        }
    }

    /// Whether this was an InformRequest.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Notification::InformV2c { .. })
    }

    pub fn version(&self) -> Version {
        match self {
            Notification::TrapV1 { .. } => Version::V1,
            Notification::TrapV2c { .. } | Notification::InformV2c { .. } => Version::V2c,
        }
    }
}

/// Builder for [`NotificationReceiver`].
pub struct NotificationReceiverBuilder {
    bind_addr: String,
    communities: Vec<Bytes>,
    recv_buffer_size: Option<usize>,
}

impl NotificationReceiverBuilder {
    /// Defaults: bind `0.0.0.0:162`, accept any community.
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:162".into(),
            communities: Vec::new(),
            recv_buffer_size: None,
        }
    }

    /// Set the UDP bind address.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Accept notifications carrying `community`. May be repeated.
    pub fn community(mut self, community: &[u8]) -> Self {
        self.communities.push(Bytes::copy_from_slice(community));
        self
    }

    /// Request a socket receive buffer size.
    pub fn recv_buffer_size(mut self, size: Option<usize>) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Bind the UDP socket and build the receiver.
    pub async fn build(self) -> Result<NotificationReceiver> {
        let bind_addr: SocketAddr = self.bind_addr.parse().map_err(|_| {
            Error::Config(format!("invalid bind address: {}", self.bind_addr).into())
        })?;
        let socket = bind_udp_socket(bind_addr, self.recv_buffer_size).map_err(|source| {
            Error::Io {
                target: Some(bind_addr),
                source,
            }
        })?;
        Ok(self.build_with_transport(socket))
    }

    /// Build the receiver over an already-bound transport.
    pub fn build_with_transport<T: AgentTransport>(self, transport: T) -> NotificationReceiver<T> {
        let local_addr = transport.local_addr();
        tracing::info!(target: "async_snmp_agent::notification", { snmp.local_addr = %local_addr }, "notification receiver ready");
        NotificationReceiver {
            inner: Arc::new(ReceiverInner {
                transport,
                local_addr,
                communities: self.communities,
                malformed_messages: AtomicU32::new(0),
                ignored_pdus: AtomicU32::new(0),
            }),
        }
    }
}

impl Default for NotificationReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct ReceiverInner<T> {
    transport: T,
    local_addr: SocketAddr,
    communities: Vec<Bytes>,
    malformed_messages: AtomicU32,
    /// Well-formed messages that were not notifications, or carried a
    /// community that is not accepted.
    ignored_pdus: AtomicU32,
}

/// Receives traps and informs on a datagram transport.
///
/// Cloning is cheap; clones share the transport and counters.
pub struct NotificationReceiver<T: AgentTransport = UdpSocket> {
    inner: Arc<ReceiverInner<T>>,
}

impl NotificationReceiver {
    pub fn builder() -> NotificationReceiverBuilder {
        NotificationReceiverBuilder::new()
    }
}

impl<T: AgentTransport> NotificationReceiver<T> {
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    /// Datagrams that failed to parse.
    pub fn malformed_messages(&self) -> u32 {
        self.inner.malformed_messages.load(Ordering::Relaxed)
    }

    /// Messages dropped for their PDU type or community.
    pub fn ignored_pdus(&self) -> u32 {
        self.inner.ignored_pdus.load(Ordering::Relaxed)
    }

    /// Wait for the next notification.
    ///
    /// Anything that is not an acceptable notification is logged, counted
    /// and skipped. An InformRequest is acknowledged before it is returned.
    #[instrument(skip(self), err, fields(snmp.local_addr = %self.local_addr()))]
    pub async fn recv(&self) -> Result<(Notification, SocketAddr)> {
        let mut buf = vec![0u8; 65535];

        loop {
            let (len, source) = self.inner.transport.recv_from(&mut buf).await?;
            let data = Bytes::copy_from_slice(&buf[..len]);

            match self.handle_datagram(data, source).await {
                Ok(Some(notification)) => return Ok((notification, source)),
                Ok(None) => continue,
                Err(e) => {
                    self.inner.malformed_messages.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(target: "async_snmp_agent::notification", { snmp.source = %source, error = %e }, "invalid notification");
                }
            }
        }
    }

    async fn handle_datagram(&self, data: Bytes, source: SocketAddr) -> Result<Option<Notification>> {
        let msg = Message::decode(data)?;
        tracing::trace!(target: "async_snmp_agent::notification", { snmp.source = %source, pdu_type = %msg.pdu.pdu_type() }, "received message");

        if !self.accepts(&msg.community) {
            return Ok(self.ignore(source, msg.pdu.pdu_type(), "unknown community"));
        }

        let Message {
            version,
            community,
            pdu,
        } = msg;
        let pdu = match (version, pdu) {
            (Version::V1, Pdu::TrapV1(trap)) => {
                return Ok(Some(Notification::TrapV1 { community, trap }));
            }
            (Version::V2c, Pdu::Std(pdu))
                if matches!(pdu.pdu_type, PduType::SnmpV2Trap | PduType::InformRequest) =>
            {
                pdu
            }
            (_, pdu) => return Ok(self.ignore(source, pdu.pdu_type(), "not a notification")),
        };

        let (uptime, trap_oid, varbinds) = split_notification_varbinds(&pdu)?;
        if pdu.pdu_type == PduType::SnmpV2Trap {
            return Ok(Some(Notification::TrapV2c {
                community,
                uptime,
                trap_oid,
                varbinds,
                request_id: pdu.request_id,
            }));
        }

        let ack = Message::v2c(community.clone(), pdu.to_response()).encode()?;
        self.inner.transport.send_to(&ack, source).await?;
        tracing::debug!(target: "async_snmp_agent::notification", { snmp.source = %source, snmp.request_id = pdu.request_id }, "sent Inform response");

        Ok(Some(Notification::InformV2c {
            community,
            uptime,
            trap_oid,
            varbinds,
            request_id: pdu.request_id,
        }))
    }

    fn accepts(&self, community: &[u8]) -> bool {
        self.inner.communities.is_empty()
            || self
                .inner
                .communities
                .iter()
                .any(|c| c.as_ref() == community)
    }

    fn ignore(&self, source: SocketAddr, pdu_type: PduType, reason: &'static str) -> Option<Notification> {
        self.inner.ignored_pdus.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(target: "async_snmp_agent::notification", { snmp.source = %source, pdu_type = %pdu_type, reason }, "ignoring message");
        None
    }
}

impl<T: AgentTransport> Clone for NotificationReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
