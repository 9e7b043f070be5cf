//! Links that carry encoded frames to panels.
//!
//! ## Sub-modules
//!
//! | Module   | Purpose                                              |
//! |----------|------------------------------------------------------|
//! | `udp`    | One persistent connected datagram socket             |
//! | `tcp`    | A fresh stream per frame, closed after every write   |
//! | `serial` | Persistent RS-485 byte stream at a fixed baud rate   |
//!
//! Every variant implements [`Transport`]. [`Client`] is the tagged
//! union a [`Display`](crate::Display) holds, so the set of links is
//! closed and dispatch is a plain `match`.

pub mod serial;
pub mod tcp;
pub mod udp;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::frame::Frame;

pub use serial::{SERIAL_BAUD, SerialClient};
pub use tcp::TcpClient;
pub use udp::UdpClient;

// ── Transport ────────────────────────────────────────────────────

/// Common contract of every link.
#[async_trait]
pub trait Transport: Send {
    /// Acquire the underlying socket or device.
    async fn open(&mut self) -> Result<(), TransportError>;

    /// Release the underlying socket or device.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Frame `data` for `address` and transmit it.
    async fn send(&mut self, address: u8, data: &[u8], refresh: bool)
    -> Result<(), TransportError>;

    /// Which kind of link this is.
    fn kind(&self) -> ChannelKind;
}

/// Frame a panel payload, mapping an unsupported length to a transport
/// error.
pub(crate) fn format_message(
    address: u8,
    data: &[u8],
    refresh: bool,
) -> Result<Vec<u8>, TransportError> {
    Frame::new(address, data.to_vec(), refresh)
        .map(|f| f.to_bytes())
        .map_err(|_| TransportError::Encode(data.len()))
}

// ── ChannelKind ──────────────────────────────────────────────────

/// The three supported link types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Udp,
    Tcp,
    Serial,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Udp => write!(f, "udp"),
            ChannelKind::Tcp => write!(f, "tcp"),
            ChannelKind::Serial => write!(f, "serial"),
        }
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = String;

    /// Accepts `udp`, `tcp` and `serial`, with `usb` and `rs485` as
    /// aliases for serial.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(ChannelKind::Udp),
            "tcp" => Ok(ChannelKind::Tcp),
            "serial" | "usb" | "rs485" => Ok(ChannelKind::Serial),
            other => Err(format!("unknown protocol '{other}' (expected udp, tcp or serial)")),
        }
    }
}

// ── Endpoint ─────────────────────────────────────────────────────

/// Where a client connects: host and port for sockets, device path for
/// serial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub protocol: ChannelKind,
    pub host: String,
    pub port: u16,
    pub device: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            protocol: ChannelKind::Udp,
            host: "localhost".into(),
            port: 5000,
            device: "/dev/ttyUSB0".into(),
        }
    }
}

impl Endpoint {
    /// Build an unopened client for this endpoint.
    pub fn client(&self) -> Client {
        match self.protocol {
            ChannelKind::Udp => Client::Udp(UdpClient::new(&self.host, self.port)),
            ChannelKind::Tcp => Client::Tcp(TcpClient::new(&self.host, self.port)),
            ChannelKind::Serial => Client::Serial(SerialClient::new(&self.device)),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol {
            ChannelKind::Serial => write!(f, "serial:{}", self.device),
            kind => write!(f, "{kind}://{}:{}", self.host, self.port),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────

/// One concrete link.
#[derive(Debug)]
pub enum Client {
    Udp(UdpClient),
    Tcp(TcpClient),
    Serial(SerialClient),
}

#[async_trait]
impl Transport for Client {
    async fn open(&mut self) -> Result<(), TransportError> {
        match self {
            Client::Udp(c) => c.open().await,
            Client::Tcp(c) => c.open().await,
            Client::Serial(c) => c.open().await,
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self {
            Client::Udp(c) => c.close().await,
            Client::Tcp(c) => c.close().await,
            Client::Serial(c) => c.close().await,
        }
    }

    async fn send(
        &mut self,
        address: u8,
        data: &[u8],
        refresh: bool,
    ) -> Result<(), TransportError> {
        match self {
            Client::Udp(c) => c.send(address, data, refresh).await,
            Client::Tcp(c) => c.send(address, data, refresh).await,
            Client::Serial(c) => c.send(address, data, refresh).await,
        }
    }

    fn kind(&self) -> ChannelKind {
        match self {
            Client::Udp(_) => ChannelKind::Udp,
            Client::Tcp(_) => ChannelKind::Tcp,
            Client::Serial(_) => ChannelKind::Serial,
        }
    }
}

impl From<UdpClient> for Client {
    fn from(c: UdpClient) -> Self {
        Client::Udp(c)
    }
}

impl From<TcpClient> for Client {
    fn from(c: TcpClient) -> Self {
        Client::Tcp(c)
    }
}

impl From<SerialClient> for Client {
    fn from(c: SerialClient) -> Self {
        Client::Serial(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_message_frames_payload() {
        let bytes = format_message(1, &[0x7F; 28], true).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[1], 0x84);
        assert!(matches!(
            format_message(1, &[0; 5], true),
            Err(TransportError::Encode(5))
        ));
    }

    #[test]
    fn endpoint_builds_matching_client() {
        let mut ep = Endpoint::default();
        assert_eq!(ep.client().kind(), ChannelKind::Udp);
        ep.protocol = ChannelKind::Tcp;
        assert_eq!(ep.client().kind(), ChannelKind::Tcp);
        ep.protocol = ChannelKind::Serial;
        assert_eq!(ep.client().kind(), ChannelKind::Serial);
        assert_eq!(ep.to_string(), "serial:/dev/ttyUSB0");
    }

    #[test]
    fn channel_kind_parses_aliases() {
        assert_eq!("UDP".parse::<ChannelKind>(), Ok(ChannelKind::Udp));
        assert_eq!("usb".parse::<ChannelKind>(), Ok(ChannelKind::Serial));
        assert!("carrier-pigeon".parse::<ChannelKind>().is_err());
    }

    #[test]
    fn channel_kind_serde_lowercase() {
        #[derive(Deserialize)]
        struct Wrap {
            protocol: ChannelKind,
        }
        let w: Wrap = serde_json::from_str(r#"{"protocol":"tcp"}"#).unwrap();
        assert_eq!(w.protocol, ChannelKind::Tcp);
    }
}
