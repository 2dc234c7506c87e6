//! Builder for [`Client`].

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::transport::AgentTransport;
use crate::util::bind_udp_socket;
use crate::version::Version;

use super::{Client, ClientConfig};

/// Builder for a community-based client; see [`Client::v1`] and [`Client::v2c`].
pub struct ClientBuilder {
    target: String,
    bind_addr: Option<String>,
    config: ClientConfig,
}

impl ClientBuilder {
    pub(super) fn new(target: impl Into<String>, version: Version) -> Self {
        Self {
            target: target.into(),
            bind_addr: None,
            config: ClientConfig {
                version,
                ..ClientConfig::default()
            },
        }
    }

    /// Set the community string.
    pub fn community(mut self, community: &[u8]) -> Self {
        self.config.community = Bytes::copy_from_slice(community);
        self
    }

    /// Set the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the number of retries after the first attempt.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Set the largest datagram accepted as a response.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Enterprise OID carried by v1 Traps.
    pub fn enterprise(mut self, enterprise: Oid) -> Self {
        self.config.enterprise = enterprise;
        self
    }

    /// Agent address carried by v1 Traps.
    pub fn agent_addr(mut self, addr: Ipv4Addr) -> Self {
        self.config.agent_addr = addr.octets();
        self
    }

    /// Local address to send from. Defaults to an ephemeral port on the
    /// target's address family.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }

    fn resolve_target(&self) -> Result<SocketAddr> {
        self.target
            .to_socket_addrs()
            .map_err(|e| Error::Io {
                target: None,
                source: e,
            })?
            .next()
            .ok_or_else(|| Error::Io {
                target: None,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "could not resolve address",
                ),
            })
    }

    /// Bind a UDP socket and create the client.
    pub async fn connect(self) -> Result<Client> {
        let target = self.resolve_target()?;
        let bind_addr: SocketAddr = match &self.bind_addr {
            Some(addr) => addr
                .parse()
                .map_err(|_| Error::Config(format!("invalid bind address: {}", addr).into()))?,
            None if target.is_ipv6() => SocketAddr::from(([0u16; 8], 0)),
            None => SocketAddr::from(([0, 0, 0, 0], 0)),
        };
        let socket = bind_udp_socket(bind_addr, None).map_err(|source| Error::Io {
            target: Some(bind_addr),
            source,
        })?;
        Ok(Client::new(socket, target, self.config))
    }

    /// Create the client over an already-bound transport.
    pub fn build_with_transport<T: AgentTransport>(self, transport: T) -> Result<Client<T>> {
        let target = self.resolve_target()?;
        Ok(Client::new(transport, target, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn test_builder_settings() {
        let builder = Client::v1("127.0.0.1:161")
            .community(b"private")
            .timeout(Duration::from_millis(250))
            .retries(0)
            .enterprise(oid!(1, 3, 6, 1, 4, 1, 99))
            .agent_addr(Ipv4Addr::new(10, 0, 0, 1));

        assert_eq!(builder.config.version, Version::V1);
        assert_eq!(builder.config.community.as_ref(), b"private");
        assert_eq!(builder.config.timeout, Duration::from_millis(250));
        assert_eq!(builder.config.retries, 0);
        assert_eq!(builder.config.agent_addr, [10, 0, 0, 1]);
        assert_eq!(builder.resolve_target().unwrap(), "127.0.0.1:161".parse().unwrap());
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_bind() {
        let err = Client::v2c("127.0.0.1:161").bind("nowhere").connect().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
