//! Agent-side transport abstraction.
//!
//! The agent only needs a datagram socket: receive from anyone, reply to the
//! sender. [`tokio::net::UdpSocket`] is the default implementation.

use crate::error::{Error, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Datagram transport the agent listens on (listener mode).
pub trait AgentTransport: Send + Sync + 'static {
    /// Receive one datagram from any source.
    fn recv_from(&self, buf: &mut [u8])
    -> impl Future<Output = Result<(usize, SocketAddr)>> + Send;

    /// Send one datagram to a specific target.
    fn send_to(&self, data: &[u8], target: SocketAddr) -> impl Future<Output = Result<()>> + Send;

    /// Local bind address.
    fn local_addr(&self) -> SocketAddr;
}

impl AgentTransport for UdpSocket {
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
            .await
            .map_err(|source| Error::Io {
                target: None,
                source,
            })
    }

    async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<()> {
        UdpSocket::send_to(self, data, target)
            .await
            .map(|_| ())
            .map_err(|source| Error::Io {
                target: Some(target),
                source,
            })
    }

    fn local_addr(&self) -> SocketAddr {
        UdpSocket::local_addr(self)
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)))
    }
}

impl<T: AgentTransport> AgentTransport for Arc<T> {
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(usize, SocketAddr)>> + Send {
        (**self).recv_from(buf)
    }

    fn send_to(&self, data: &[u8], target: SocketAddr) -> impl Future<Output = Result<()>> + Send {
        (**self).send_to(data, target)
    }

    fn local_addr(&self) -> SocketAddr {
        (**self).local_addr()
    }
}
