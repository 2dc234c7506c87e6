//! Minimal SNMP manager for driving an agent over loopback UDP.

use std::net::SocketAddr;
use std::time::Duration;

use async_snmp_agent::{Message, Oid, PduType, StdPdu, VarBind, Version};
use bytes::Bytes;
use tokio::net::UdpSocket;

pub struct Manager {
    socket: UdpSocket,
    agent: SocketAddr,
    version: Version,
    community: Bytes,
    next_id: i32,
}

impl Manager {
    pub async fn new(agent: SocketAddr, version: Version, community: &[u8]) -> Self {
        Self {
            socket: UdpSocket::bind("127.0.0.1:0").await.unwrap(),
            agent,
            version,
            community: Bytes::copy_from_slice(community),
            next_id: 1,
        }
    }

    /// Send raw bytes and wait briefly for a reply.
    pub async fn exchange_raw(&self, data: &[u8], wait: Duration) -> Option<Bytes> {
        self.socket.send_to(data, self.agent).await.unwrap();
        let mut buf = vec![0u8; 65535];
        match tokio::time::timeout(wait, self.socket.recv_from(&mut buf)).await {
            Ok(Ok((n, _))) => Some(Bytes::copy_from_slice(&buf[..n])),
            _ => None,
        }
    }

    /// Send a PDU and decode the response.
    pub async fn request(&mut self, pdu: StdPdu) -> Option<StdPdu> {
        self.request_within(pdu, Duration::from_secs(2)).await
    }

    /// Like [`request`](Self::request), giving up after `wait`.
    pub async fn request_within(&mut self, mut pdu: StdPdu, wait: Duration) -> Option<StdPdu> {
        pdu.request_id = self.next_id;
        self.next_id += 1;

        let msg = Message::new(self.version, self.community.clone(), pdu.clone());
        let reply = self
            .exchange_raw(&msg.encode().unwrap(), wait)
            .await?;
        let reply = Message::decode(reply).unwrap();
        assert_eq!(reply.version, self.version);
        let response = reply.std_pdu().unwrap().clone();
        assert_eq!(response.pdu_type, PduType::Response);
        assert_eq!(response.request_id, pdu.request_id);
        Some(response)
    }

    pub async fn get(&mut self, oids: &[Oid]) -> StdPdu {
        let varbinds = oids.iter().cloned().map(VarBind::null).collect();
        self.request(StdPdu::new(PduType::GetRequest, 0, varbinds))
            .await
            .unwrap()
    }

    pub async fn get_next(&mut self, oids: &[Oid]) -> StdPdu {
        let varbinds = oids.iter().cloned().map(VarBind::null).collect();
        self.request(StdPdu::new(PduType::GetNextRequest, 0, varbinds))
            .await
            .unwrap()
    }

    pub async fn get_bulk(
        &mut self,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> StdPdu {
        let varbinds = oids.iter().cloned().map(VarBind::null).collect();
        self.request(StdPdu::get_bulk(0, non_repeaters, max_repetitions, varbinds))
            .await
            .unwrap()
    }

    pub async fn set(&mut self, varbinds: Vec<VarBind>) -> StdPdu {
        self.request(StdPdu::new(PduType::SetRequest, 0, varbinds))
            .await
            .unwrap()
    }

    /// GetNext walk of the subtree under `root`.
    pub async fn walk(&mut self, root: &Oid) -> Vec<VarBind> {
        let mut out = Vec::new();
        let mut from = root.clone();
        loop {
            let response = self.get_next(std::slice::from_ref(&from)).await;
            let vb = response.varbinds[0].clone();
            if vb.value().is_exception() || !vb.oid.starts_with(root) {
                return out;
            }
            assert!(vb.oid > from, "walk went backwards: {} after {}", vb.oid, from);
            from = vb.oid.clone();
            out.push(vb);
        }
    }
}
