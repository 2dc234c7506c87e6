//! Internal utilities.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Bind the agent's listening socket.
///
/// IPv6 addresses are bound dual-stack (`IPV6_V6ONLY = false`) so `[::]:161`
/// also serves IPv4 managers. `recv_buffer_size` sets `SO_RCVBUF`; the
/// kernel caps it at `net.core.rmem_max` and a refusal is not an error.
pub(crate) fn bind_udp_socket(
    addr: SocketAddr,
    recv_buffer_size: Option<usize>,
) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    if let Some(size) = recv_buffer_size
        && let Err(e) = socket.set_recv_buffer_size(size)
    {
        tracing::debug!(target: "async_snmp_agent::agent", { size, error = %e }, "receive buffer size not applied");
    }

    // tokio requires a non-blocking socket
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    UdpSocket::from_std(socket.into())
}
