//! TCP link: connect, write one frame, close.
//!
//! The frame format has no session, so nothing is kept between sends and
//! `open`/`close` do nothing.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::{ChannelKind, Transport, format_message};
use crate::error::TransportError;

/// Default bound on connecting to the target.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection-per-frame client.
#[derive(Debug, Clone)]
pub struct TcpClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl TcpClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// `host:port` of the target.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl Transport for TcpClient {
    async fn open(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send(
        &mut self,
        address: u8,
        data: &[u8],
        refresh: bool,
    ) -> Result<(), TransportError> {
        let msg = format_message(address, data, refresh)?;

        let mut stream =
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect(self.target()))
                .await
            {
                Ok(conn) => conn?,
                Err(_) => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("connect to {} timed out", self.target()),
                    )
                    .into());
                }
            };

        // The stream is shut down on both paths; a write error still wins.
        let written = stream.write_all(&msg).await;
        let closed = stream.shutdown().await;
        written?;
        closed?;
        Ok(())
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Tcp
    }
}

// ── Tests ────────────────────────────────────────────────────────
