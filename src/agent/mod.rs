//! SNMP v1/v2c agent.
//!
//! The agent answers GetRequest, GetNextRequest, GetBulkRequest and
//! SetRequest PDUs from the providers registered in its MIB tree. Each
//! datagram is handled in its own task, and each variable binding of a
//! request is resolved concurrently; see [`Provider`](crate::handler::Provider).
//!
//! # Example
//!
//! ```rust,no_run
//! use async_snmp_agent::agent::Agent;
//! use async_snmp_agent::handler::{Registration, provider_fn, read_only_scalar};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<async_snmp_agent::Error>> {
//!     let agent = Agent::builder()
//!         .bind("0.0.0.0:1161")
//!         .community(b"public")
//!         .provider(Registration::scalar(
//!             "1.3.6.1.2.1.1.1",
//!             provider_fn(|req| read_only_scalar(req, "My SNMP Agent")),
//!         )?)
//!         .build()
//!         .await?;
//!
//!     agent.run().await?;
//!     Ok(())
//! }
//! ```

mod dispatch;
mod response;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::error::{DecodeErrorKind, Error, Result};
use crate::handler::{Handlers, Registration};
use crate::message::{Message, Outbound};
use crate::mib::Mib;
use crate::pdu::{Pdu, PduType};
use crate::transport::AgentTransport;
use crate::util::bind_udp_socket;
use crate::value::{TypeRegistry, default_registry};
use crate::version::Version;

use dispatch::{Dispatcher, RequestOrigin};

/// Default maximum message size for UDP (Ethernet MTU less IP/UDP headers).
const DEFAULT_MAX_MESSAGE_SIZE: usize = 1472;

/// Smallest message size every SNMP entity must accept (RFC 3417).
const MIN_MAX_MESSAGE_SIZE: usize = 484;

/// Builder for [`Agent`].
///
/// Registration problems (malformed OIDs, a provider placed above or below
/// another) are reported by [`build`](AgentBuilder::build).
pub struct AgentBuilder {
    bind_addr: String,
    communities: Vec<Bytes>,
    registrations: Vec<Registration>,
    recv_buffer_size: Option<usize>,
    max_message_size: usize,
    provider_timeout: Option<Duration>,
    registry: Option<TypeRegistry>,
    cancel: Option<CancellationToken>,
}

impl AgentBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Bind address: `0.0.0.0:161` (UDP)
    /// - Max message size: 1472 bytes
    /// - Receive buffer size: 4MB (requested from kernel)
    /// - No communities (any community is accepted)
    /// - No provider timeout
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:161".to_string(),
            communities: Vec::new(),
            registrations: Vec::new(),
            recv_buffer_size: Some(4 * 1024 * 1024),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            provider_timeout: None,
            registry: None,
            cancel: None,
        }
    }

    /// Set the UDP bind address.
    ///
    /// Binding port 161 usually requires privileges. `[::]:port` binds
    /// dual-stack.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Accept requests carrying this community string.
    ///
    /// May be called repeatedly. With no community configured, every
    /// community is accepted.
    pub fn community(mut self, community: &[u8]) -> Self {
        self.communities.push(Bytes::copy_from_slice(community));
        self
    }

    /// Accept several community strings.
    pub fn communities<I, C>(mut self, communities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        self.communities.extend(
            communities
                .into_iter()
                .map(|c| Bytes::copy_from_slice(c.as_ref())),
        );
        self
    }

    /// Register a provider chain.
    pub fn provider(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Register several provider chains.
    pub fn providers(mut self, registrations: impl IntoIterator<Item = Registration>) -> Self {
        self.registrations.extend(registrations);
        self
    }

    /// Socket receive buffer size (`SO_RCVBUF`). `None` keeps the OS default.
    pub fn recv_buffer_size(mut self, size: Option<usize>) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Largest response the agent will send, in bytes.
    ///
    /// Values below 484 are raised to 484.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size.max(MIN_MAX_MESSAGE_SIZE);
        self
    }

    /// Fail a binding with `genErr` when its providers take longer than this.
    ///
    /// Without a timeout a provider that never completes leaves its request
    /// unanswered.
    pub fn provider_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Tag registry used to decode incoming values.
    pub fn type_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set a cancellation token for graceful shutdown.
    ///
    /// If not set, the agent creates its own token accessible via
    /// [`Agent::cancel`].
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bind the UDP socket and build the agent.
    pub async fn build(self) -> Result<Agent> {
        let bind_addr: SocketAddr = self.bind_addr.parse().map_err(|_| {
            Error::Config(format!("invalid bind address: {}", self.bind_addr).into())
        })?;

        let socket = bind_udp_socket(bind_addr, self.recv_buffer_size).map_err(|source| {
            Error::Io {
                target: Some(bind_addr),
                source,
            }
        })?;

        self.build_with_transport(socket)
    }

    /// Build the agent over an already-bound transport.
    pub fn build_with_transport<T: AgentTransport>(self, transport: T) -> Result<Agent<T>> {
        let mut mib = Mib::new();
        for registration in &self.registrations {
            let chain = registration.handler_chain()?;
            mib.add(&registration.oid, chain, registration.columns.as_deref())?;
        }

        let local_addr = transport.local_addr();
        tracing::info!(
            target: "async_snmp_agent::agent",
            { snmp.local_addr = %local_addr, objects = mib.objects().count() },
            "agent ready"
        );

        Ok(Agent {
            inner: Arc::new(AgentInner {
                transport,
                local_addr,
                communities: self.communities,
                dispatcher: Arc::new(Dispatcher::new(
                    mib,
                    self.provider_timeout,
                    self.max_message_size,
                )),
                registry: self.registry,
                max_message_size: self.max_message_size,
                snmp_in_asn_parse_errs: AtomicU32::new(0),
                snmp_in_bad_versions: AtomicU32::new(0),
                snmp_in_bad_community_names: AtomicU32::new(0),
                dropped_pdus: AtomicU32::new(0),
                snmp_silent_drops: AtomicU32::new(0),
                cancel: self.cancel.unwrap_or_default(),
            }),
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Inner state shared across agent clones.
struct AgentInner<T> {
    transport: T,
    local_addr: SocketAddr,
    communities: Vec<Bytes>,
    dispatcher: Arc<Dispatcher>,
    registry: Option<TypeRegistry>,
    max_message_size: usize,
    /// snmpInASNParseErrs (1.3.6.1.2.1.11.6)
    snmp_in_asn_parse_errs: AtomicU32,
    /// snmpInBadVersions (1.3.6.1.2.1.11.3)
    snmp_in_bad_versions: AtomicU32,
    /// snmpInBadCommunityNames (1.3.6.1.2.1.11.4)
    snmp_in_bad_community_names: AtomicU32,
    /// Well-formed messages carrying a PDU the agent does not answer.
    dropped_pdus: AtomicU32,
    /// snmpSilentDrops (1.3.6.1.2.1.11.31)
    snmp_silent_drops: AtomicU32,
    cancel: CancellationToken,
}

/// SNMP v1/v2c agent.
///
/// Cloning is cheap; clones share the transport, MIB and counters.
pub struct Agent<T: AgentTransport = UdpSocket> {
    inner: Arc<AgentInner<T>>,
}

impl Agent {
    /// Create a builder for configuring the agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }
}

impl<T: AgentTransport> Agent<T> {
    /// Get the local address the agent is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    /// Get the cancellation token for this agent.
    ///
    /// Call `token.cancel()` to stop [`run`](Agent::run).
    pub fn cancel(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// The MIB tree the agent serves.
    pub fn mib(&self) -> &Mib<Handlers> {
        self.inner.dispatcher.mib()
    }

    /// Datagrams dropped because they could not be decoded.
    pub fn snmp_in_asn_parse_errs(&self) -> u32 {
        self.inner.snmp_in_asn_parse_errs.load(Ordering::Relaxed)
    }

    /// Datagrams dropped for an unsupported version (including SNMPv3).
    pub fn snmp_in_bad_versions(&self) -> u32 {
        self.inner.snmp_in_bad_versions.load(Ordering::Relaxed)
    }

    /// Requests dropped for an unknown community.
    pub fn snmp_in_bad_community_names(&self) -> u32 {
        self.inner
            .snmp_in_bad_community_names
            .load(Ordering::Relaxed)
    }

    /// Messages dropped because their PDU is not a request the agent answers.
    pub fn dropped_pdus(&self) -> u32 {
        self.inner.dropped_pdus.load(Ordering::Relaxed)
    }

    /// Requests dropped because not even a `tooBig` response would fit.
    pub fn snmp_silent_drops(&self) -> u32 {
        self.inner.snmp_silent_drops.load(Ordering::Relaxed)
    }

    /// Run the agent until the cancellation token fires.
    ///
    /// Each datagram is processed in its own task.
    #[instrument(skip(self), err, fields(snmp.local_addr = %self.local_addr()))]
    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; 65535];
        tracing::info!(target: "async_snmp_agent::agent", "agent listening");

        loop {
            let (len, source) = tokio::select! {
                result = self.inner.transport.recv_from(&mut buf) => {
                    result?
                }
                _ = self.inner.cancel.cancelled() => {
                    tracing::info!(target: "async_snmp_agent::agent", "agent shutdown requested");
                    return Ok(());
                }
            };

            let data = Bytes::copy_from_slice(&buf[..len]);
            let agent = self.clone();

            tokio::spawn(async move {
                let Some(outbound) = agent.handle_datagram(data, source).await else {
                    return;
                };
                if let Err(e) = agent
                    .inner
                    .transport
                    .send_to(&outbound.bytes, outbound.destination)
                    .await
                {
                    tracing::warn!(target: "async_snmp_agent::agent", { snmp.source = %source, error = %e }, "failed to send response");
                }
            });
        }
    }

    /// Process one datagram and produce the response to send, if any.
    ///
    /// Malformed messages, unknown communities and PDUs the agent does not
    /// answer are counted and dropped.
    pub async fn handle_datagram(&self, data: Bytes, source: SocketAddr) -> Option<Outbound> {
        let registry = self.inner.registry.as_ref().unwrap_or_else(|| default_registry());
        let msg = match Message::decode_with(registry, data) {
            Ok(msg) => msg,
            Err(e) => {
                self.count_decode_error(&e);
                tracing::debug!(target: "async_snmp_agent::agent", { snmp.source = %source, error = %e }, "dropping malformed message");
                return None;
            }
        };

        if !self.validate_community(&msg.community) {
            self.inner
                .snmp_in_bad_community_names
                .fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target: "async_snmp_agent::agent", { snmp.source = %source }, "unknown community string");
            return None;
        }

        let request = match &msg.pdu {
            Pdu::Std(pdu) if pdu.pdu_type.is_request() => pdu,
            pdu => return self.drop_pdu(source, pdu.pdu_type(), msg.version),
        };
        if request.pdu_type == PduType::GetBulkRequest && msg.version == Version::V1 {
            return self.drop_pdu(source, request.pdu_type, msg.version);
        }

        let origin = RequestOrigin {
            op: request.pdu_type,
            source,
            version: msg.version,
            community: msg.community.clone(),
            request_id: request.request_id,
        };
        let mut response = self.inner.dispatcher.dispatch(origin, request).await;
        if msg.version == Version::V1 {
            response::shape_v1(request, &mut response);
        }

        let encoded = response::encode_response(
            msg.version,
            msg.community.clone(),
            request.pdu_type,
            response,
            self.inner.max_message_size,
        );
        match encoded {
            Ok(Some(bytes)) => Some(Outbound {
                bytes,
                destination: source,
            }),
            Ok(None) => {
                self.inner.snmp_silent_drops.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: "async_snmp_agent::agent", { snmp.source = %source, snmp.request_id = request.request_id }, "response too large, dropping");
                None
            }
            Err(e) => {
                tracing::warn!(target: "async_snmp_agent::agent", { snmp.source = %source, error = %e }, "failed to encode response");
                None
            }
        }
    }

    fn count_decode_error(&self, error: &Error) {
        let counter = match error {
            Error::NoSupport { .. }
            | Error::Decode {
                kind: DecodeErrorKind::UnknownVersion(_),
                ..
            } => &self.inner.snmp_in_bad_versions,
            _ => &self.inner.snmp_in_asn_parse_errs,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn drop_pdu(&self, source: SocketAddr, pdu_type: PduType, version: Version) -> Option<Outbound> {
        self.inner.dropped_pdus.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            target: "async_snmp_agent::agent",
            { snmp.source = %source, pdu_type = %pdu_type, version = %version },
            "dropping PDU the agent does not answer"
        );
        None
    }

    /// Whether `community` is accepted. With none configured, all are.
    fn validate_community(&self, community: &[u8]) -> bool {
        self.inner.communities.is_empty()
            || self
                .inner
                .communities
                .iter()
                .any(|c| c.as_ref() == community)
    }
}

impl<T: AgentTransport> Clone for Agent<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: AgentTransport> std::fmt::Debug for Agent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("local_addr", &self.inner.local_addr)
            .field("objects", &self.mib().objects().count())
            .finish_non_exhaustive()
    }
}
