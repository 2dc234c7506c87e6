//! SNMP v1/v2c manager client.
//!
//! A [`Client`] talks to one target. Besides the request operations it sends
//! notifications: v1 Traps, SNMPv2-Traps and confirmed Informs.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use async_snmp_agent::client::Client;
//! use async_snmp_agent::oid;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> async_snmp_agent::Result<()> {
//!     let client = Client::v2c("192.0.2.1:161")
//!         .community(b"public")
//!         .timeout(Duration::from_secs(2))
//!         .connect()
//!         .await?;
//!
//!     let descr = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
//!     println!("{}", descr.value());
//!     Ok(())
//! }
//! ```

mod builder;

pub use builder::ClientBuilder;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::error::{Error, ErrorStatus, Result};
use crate::message::Message;
use crate::notification::notification_varbinds;
use crate::oid::Oid;
use crate::pdu::{GenericTrap, Pdu, PduType, StdPdu, TrapV1Pdu};
use crate::transport::AgentTransport;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub version: Version,
    pub community: Bytes,
    /// How long to wait for each attempt.
    pub timeout: Duration,
    /// Attempts after the first.
    pub retries: u32,
    /// Receive buffer size for responses.
    pub max_message_size: usize,
    /// Enterprise OID sent in v1 Traps.
    pub enterprise: Oid,
    /// Agent address sent in v1 Traps.
    pub agent_addr: [u8; 4],
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            timeout: Duration::from_secs(5),
            retries: 3,
            max_message_size: 65535,
            enterprise: crate::oid!(1, 3, 6, 1, 4, 1, 3, 1, 1),
            agent_addr: [127, 0, 0, 1],
        }
    }
}

struct ClientInner<T> {
    transport: T,
    target: SocketAddr,
    config: ClientConfig,
    started: Instant,
    next_request_id: AtomicI32,
    /// Serializes request/response exchanges on the shared transport.
    exchange: Mutex<()>,
}

/// SNMP manager client for a single target.
///
/// Cloning is cheap; clones share the transport and request-id counter.
pub struct Client<T: AgentTransport = UdpSocket> {
    inner: Arc<ClientInner<T>>,
}

impl Client {
    /// Start building an SNMPv1 client.
    pub fn v1(target: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(target, Version::V1)
    }

    /// Start building an SNMPv2c client.
    pub fn v2c(target: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(target, Version::V2c)
    }
}

impl<T: AgentTransport> Client<T> {
    /// Create a client over `transport` talking to `target`.
    pub fn new(transport: T, target: SocketAddr, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                target,
                config,
                started: Instant::now(),
                next_request_id: AtomicI32::new(1),
                exchange: Mutex::new(()),
            }),
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.inner.target
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.inner.transport.local_addr()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Hundredths of a second since the client was created; the uptime sent
    /// with notifications.
    pub fn uptime(&self) -> u32 {
        (self.inner.started.elapsed().as_millis() / 10) as u32
    }

    fn next_request_id(&self) -> i32 {
        self.inner.next_request_id.fetch_add(1, Ordering::Relaxed) & i32::MAX
    }

    /// GET a single OID.
    pub async fn get(&self, oid: &Oid) -> Result<VarBind> {
        let mut varbinds = self.get_many(std::slice::from_ref(oid)).await?;
        first(&mut varbinds, self.inner.target)
    }

    /// GET several OIDs in one request.
    pub async fn get_many(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let pdu = StdPdu::new(PduType::GetRequest, self.next_request_id(), null_varbinds(oids));
        self.request(self.inner.config.version, pdu).await
    }

    /// GETNEXT for a single OID.
    pub async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        let mut varbinds = self.get_next_many(std::slice::from_ref(oid)).await?;
        first(&mut varbinds, self.inner.target)
    }

    /// GETNEXT for several OIDs in one request.
    pub async fn get_next_many(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        let pdu = StdPdu::new(PduType::GetNextRequest, self.next_request_id(), null_varbinds(oids));
        self.request(self.inner.config.version, pdu).await
    }

    /// GETBULK: one successor for each of the first `non_repeaters` OIDs,
    /// then up to `max_repetitions` successors for each of the rest.
    ///
    /// SNMPv1 has no GetBulk; a v1 client gets a configuration error.
    pub async fn get_bulk(
        &self,
        oids: &[Oid],
        non_repeaters: i32,
        max_repetitions: i32,
    ) -> Result<Vec<VarBind>> {
        if self.inner.config.version == Version::V1 {
            return Err(Error::Config("GetBulk requires SNMPv2c".into()));
        }
        let pdu = StdPdu::get_bulk(
            self.next_request_id(),
            non_repeaters,
            max_repetitions,
            null_varbinds(oids),
        );
        self.request(Version::V2c, pdu).await
    }

    /// SET a single OID.
    pub async fn set(&self, oid: &Oid, value: impl Into<Value>) -> Result<VarBind> {
        let mut varbinds = self.set_many(vec![VarBind::new(oid.clone(), value)]).await?;
        first(&mut varbinds, self.inner.target)
    }

    /// SET several bindings in one request.
    pub async fn set_many(&self, varbinds: Vec<VarBind>) -> Result<Vec<VarBind>> {
        let pdu = StdPdu::new(PduType::SetRequest, self.next_request_id(), varbinds);
        self.request(self.inner.config.version, pdu).await
    }

    /// Send an SNMPv1 Trap.
    ///
    /// Always travels in an SNMPv1 message, whatever the client version.
    /// The enterprise OID and agent address come from the configuration.
    pub async fn trap_v1(
        &self,
        generic: GenericTrap,
        specific_trap: i32,
        varbinds: Vec<VarBind>,
    ) -> Result<()> {
        let trap = TrapV1Pdu::new(
            self.inner.config.enterprise.clone(),
            self.inner.config.agent_addr,
            generic,
            specific_trap,
            self.uptime(),
            varbinds,
        );
        self.send(Version::V1, trap.into()).await
    }

    /// Send an SNMPv2-Trap: sysUpTime.0 and snmpTrapOID.0, then `varbinds`.
    ///
    /// Always travels in an SNMPv2c message.
    pub async fn trap(&self, trap_oid: &Oid, varbinds: Vec<VarBind>) -> Result<()> {
        let varbinds = notification_varbinds(self.uptime(), trap_oid, varbinds);
        let pdu = StdPdu::new(PduType::SnmpV2Trap, self.next_request_id(), varbinds);
        self.send(Version::V2c, pdu.into()).await
    }

    /// Send an InformRequest and wait for the receiver's acknowledgement.
    ///
    /// Returns the bindings of the Response.
    pub async fn inform(&self, trap_oid: &Oid, varbinds: Vec<VarBind>) -> Result<Vec<VarBind>> {
        let varbinds = notification_varbinds(self.uptime(), trap_oid, varbinds);
        let pdu = StdPdu::new(PduType::InformRequest, self.next_request_id(), varbinds);
        self.request(Version::V2c, pdu).await
    }

    /// Fire-and-forget send.
    async fn send(&self, version: Version, pdu: Pdu) -> Result<()> {
        let pdu_type = pdu.pdu_type();
        let data = Message::new(version, self.inner.config.community.clone(), pdu).encode()?;
        self.inner.transport.send_to(&data, self.inner.target).await?;
        tracing::debug!(target: "async_snmp_agent::client", { snmp.target = %self.inner.target, pdu_type = %pdu_type }, "notification sent");
        Ok(())
    }

    /// Send `pdu` and wait for the Response with the same request-id.
    ///
    /// Each attempt waits `timeout`; datagrams that do not match are
    /// skipped. A Response with a non-zero error status becomes
    /// [`Error::Snmp`].
    #[instrument(
        level = "debug",
        skip(self, pdu),
        err,
        fields(snmp.target = %self.inner.target, snmp.request_id = pdu.request_id, pdu_type = %pdu.pdu_type)
    )]
    async fn request(&self, version: Version, pdu: StdPdu) -> Result<Vec<VarBind>> {
        let target = self.inner.target;
        let request_id = pdu.request_id;
        let data = Message::new(version, self.inner.config.community.clone(), pdu).encode()?;

        let _exchange = self.inner.exchange.lock().await;
        let mut buf = vec![0u8; self.inner.config.max_message_size];
        let start = Instant::now();

        for attempt in 0..=self.inner.config.retries {
            if attempt > 0 {
                tracing::debug!(target: "async_snmp_agent::client", { snmp.target = %target, snmp.request_id = request_id, attempt }, "retrying request");
            }
            self.inner.transport.send_to(&data, target).await?;

            let deadline = tokio::time::Instant::now() + self.inner.config.timeout;
            while let Ok(received) =
                tokio::time::timeout_at(deadline, self.inner.transport.recv_from(&mut buf)).await
            {
                let (len, source) = received?;
                if let Some(response) = self.match_response(&buf[..len], source, request_id) {
                    return check_response(response, target);
                }
            }
        }

        Err(Error::Timeout {
            target: Some(target),
            elapsed: start.elapsed(),
            request_id,
            retries: self.inner.config.retries,
        })
    }

    /// The Response in `data`, if it answers `request_id`.
    fn match_response(&self, data: &[u8], source: SocketAddr, request_id: i32) -> Option<StdPdu> {
        let msg = match Message::decode(Bytes::copy_from_slice(data)) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(target: "async_snmp_agent::client", { snmp.source = %source, error = %e }, "ignoring malformed datagram");
                return None;
            }
        };
        match msg.pdu {
            Pdu::Std(pdu) if pdu.pdu_type == PduType::Response && pdu.request_id == request_id => {
                if source != self.inner.target {
                    tracing::warn!(target: "async_snmp_agent::client", { snmp.source = %source, snmp.target = %self.inner.target }, "response from unexpected source");
                }
                Some(pdu)
            }
            other => {
                tracing::debug!(
                    target: "async_snmp_agent::client",
                    { snmp.source = %source, pdu_type = %other.pdu_type(), snmp.request_id = request_id },
                    "ignoring unrelated datagram"
                );
                None
            }
        }
    }
}

impl<T: AgentTransport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: AgentTransport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("target", &self.inner.target)
            .field("version", &self.inner.config.version)
            .finish_non_exhaustive()
    }
}

fn null_varbinds(oids: &[Oid]) -> Vec<VarBind> {
    oids.iter().cloned().map(VarBind::null).collect()
}

fn check_response(response: StdPdu, target: SocketAddr) -> Result<Vec<VarBind>> {
    if response.error_status == 0 {
        return Ok(response.varbinds);
    }
    let index = response.error_index.max(0) as u32;
    let oid = (index as usize)
        .checked_sub(1)
        .and_then(|i| response.varbinds.get(i))
        .map(|vb| vb.oid.clone());
    Err(Error::Snmp {
        target: Some(target),
        status: ErrorStatus::from_i32(response.error_status),
        index,
        oid,
    })
}

fn first(varbinds: &mut Vec<VarBind>, target: SocketAddr) -> Result<VarBind> {
    if varbinds.is_empty() {
        return Err(Error::Snmp {
            target: Some(target),
            status: ErrorStatus::GenErr,
            index: 0,
            oid: None,
        });
    }
    Ok(varbinds.swap_remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    async fn pair(retries: u32) -> (Client, UdpSocket) {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = ClientConfig {
            timeout: Duration::from_millis(50),
            retries,
            ..ClientConfig::default()
        };
        let client = Client::new(
            UdpSocket::bind("127.0.0.1:0").await.unwrap(),
            peer.local_addr().unwrap(),
            config,
        );
        (client, peer)
    }

    async fn recv(peer: &UdpSocket) -> (Message, SocketAddr) {
        let mut buf = [0u8; 1500];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        (Message::decode(Bytes::copy_from_slice(&buf[..n])).unwrap(), from)
    }

    #[test]
    fn test_check_response_error() {
        let target: SocketAddr = "127.0.0.1:161".parse().unwrap();
        let mut response = StdPdu::new(
            PduType::Response,
            1,
            vec![VarBind::null(oid!(1, 3, 6, 1, 1)), VarBind::null(oid!(1, 3, 6, 1, 2))],
        );
        response.set_error(ErrorStatus::NoSuchName, 2).unwrap();

        match check_response(response, target).unwrap_err() {
            Error::Snmp { status, index, oid, .. } => {
                assert_eq!(status, ErrorStatus::NoSuchName);
                assert_eq!(index, 2);
                assert_eq!(oid, Some(oid!(1, 3, 6, 1, 2)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_after_retries() {
        let (client, peer) = pair(1).await;
        let err = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { retries: 1, .. }));

        // the first attempt and one retry
        let (first, _) = recv(&peer).await;
        let (second, _) = recv(&peer).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_stale_response_skipped() {
        let (client, peer) = pair(0).await;
        let oid = oid!(1, 3, 6, 1, 2, 1, 1, 5, 0);

        let responder = tokio::spawn(async move {
            let (msg, from) = recv(&peer).await;
            let request = msg.std_pdu().unwrap().clone();

            let mut stale = request.to_response();
            stale.request_id = request.request_id + 100;
            let stale = Message::v2c(Bytes::from_static(b"public"), stale);
            peer.send_to(&stale.encode().unwrap(), from).await.unwrap();

            let mut response = request.to_response();
            response.varbinds[0].set_value("host");
            let response = Message::v2c(Bytes::from_static(b"public"), response);
            peer.send_to(&response.encode().unwrap(), from).await.unwrap();
        });

        let vb = client.get(&oid).await.unwrap();
        assert_eq!(vb.oid, oid);
        assert_eq!(vb.value(), &Value::from("host"));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_trap_v1_and_v2_layout() {
        let (client, peer) = pair(0).await;

        client
            .trap_v1(GenericTrap::ColdStart, 0, Vec::new())
            .await
            .unwrap();
        let (msg, _) = recv(&peer).await;
        assert_eq!(msg.version, Version::V1);
        match msg.pdu {
            Pdu::TrapV1(trap) => {
                assert_eq!(trap.enterprise, oid!(1, 3, 6, 1, 4, 1, 3, 1, 1));
                assert_eq!(trap.generic(), Some(GenericTrap::ColdStart));
                assert_eq!(trap.agent_addr, [127, 0, 0, 1]);
            }
            other => panic!("expected a v1 trap, got {:?}", other.pdu_type()),
        }

        let link = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 3), Value::Integer(3));
        client
            .trap(&crate::notification::oids::link_down(), vec![link.clone()])
            .await
            .unwrap();
        let (msg, _) = recv(&peer).await;
        assert_eq!(msg.version, Version::V2c);
        let pdu = msg.std_pdu().unwrap();
        assert_eq!(pdu.pdu_type, PduType::SnmpV2Trap);
        assert_eq!(pdu.varbinds.len(), 3);
        assert_eq!(pdu.varbinds[0].oid, crate::notification::oids::sys_uptime());
        assert_eq!(
            pdu.varbinds[1].value(),
            &Value::ObjectIdentifier(crate::notification::oids::link_down())
        );
        assert_eq!(pdu.varbinds[2], link);
    }

    #[tokio::test]
    async fn test_get_bulk_refused_for_v1() {
        let (client, _peer) = pair(0).await;
        let v1 = Client::new(
            UdpSocket::bind("127.0.0.1:0").await.unwrap(),
            client.target(),
            ClientConfig {
                version: Version::V1,
                ..ClientConfig::default()
            },
        );
        let err = v1.get_bulk(&[oid!(1, 3, 6, 1)], 0, 10).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
