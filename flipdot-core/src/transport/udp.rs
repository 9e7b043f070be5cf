//! UDP link: one connected datagram socket, one frame per datagram.

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

use super::{ChannelKind, Transport, format_message};
use crate::error::TransportError;

/// Best-effort datagram client.
///
/// [`open`](Transport::open) binds an ephemeral local port and connects
/// it to the target so every [`send`](Transport::send) is a single
/// `send` call.
#[derive(Debug)]
pub struct UdpClient {
    host: String,
    port: u16,
    socket: Option<UdpSocket>,
}

impl UdpClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            socket: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// `host:port` of the target.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl Transport for UdpClient {
    async fn open(&mut self) -> Result<(), TransportError> {
        let target = tokio::net::lookup_host(self.target())
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    format!("no address for {}", self.target()),
                )
            })?;
        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;
        debug!("udp link open to {target}");
        self.socket = Some(socket);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.socket = None;
        Ok(())
    }

    async fn send(
        &mut self,
        address: u8,
        data: &[u8],
        refresh: bool,
    ) -> Result<(), TransportError> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotOpen)?;
        let msg = format_message(address, data, refresh)?;
        socket.send(&msg).await?;
        Ok(())
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Udp
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;

    #[tokio::test]
    async fn send_before_open_fails() {
        let mut client = UdpClient::new("127.0.0.1", 9);
        let err = client.send(1, &[0; 28], true).await.unwrap_err();
        assert!(matches!(err, TransportError::NotOpen));
    }

    #[tokio::test]
    async fn one_datagram_per_send() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let mut client = UdpClient::new("127.0.0.1", port);
        client.open().await.unwrap();
        assert!(client.is_open());
        client.send(4, &[0x7F; 56], false).await.unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        let frame = frame::validate(&buf[..len]).unwrap();
        assert_eq!(frame.address(), 4);
        assert_eq!(frame.payload(), &[0x7F; 56]);
        assert!(!frame.refresh());

        client.close().await.unwrap();
        assert!(!client.is_open());
    }
}
