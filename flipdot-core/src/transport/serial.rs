//! RS-485 link through a USB serial adapter.
//!
//! `serialport` is blocking, so every device call runs on the blocking
//! pool. The port moves into the blocking closure and comes back with the
//! result; no lock is needed because sends take `&mut self`.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use serialport::SerialPort;
use tracing::debug;

use super::{ChannelKind, Transport, format_message};
use crate::error::TransportError;

/// Fixed line rate of the panel controllers.
pub const SERIAL_BAUD: u32 = 57_600;

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Write-only serial client.
pub struct SerialClient {
    path: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialClient {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            baud_rate: SERIAL_BAUD,
            timeout: DEFAULT_TIMEOUT,
            port: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl fmt::Debug for SerialClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialClient")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.port.is_some())
            .finish()
    }
}

fn join_error(e: tokio::task::JoinError) -> TransportError {
    TransportError::Io(std::io::Error::other(e))
}

#[async_trait]
impl Transport for SerialClient {
    async fn open(&mut self) -> Result<(), TransportError> {
        let path = self.path.clone();
        let baud = self.baud_rate;
        let timeout = self.timeout;
        let port = tokio::task::spawn_blocking(move || {
            serialport::new(path, baud).timeout(timeout).open()
        })
        .await
        .map_err(join_error)??;
        debug!("serial link open on {} at {} baud", self.path, self.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.port = None;
        Ok(())
    }

    async fn send(
        &mut self,
        address: u8,
        data: &[u8],
        refresh: bool,
    ) -> Result<(), TransportError> {
        let msg = format_message(address, data, refresh)?;
        let mut port = self.port.take().ok_or(TransportError::NotOpen)?;

        let (port, written) = tokio::task::spawn_blocking(move || {
            let result = port.write_all(&msg).and_then(|_| port.flush());
            (port, result)
        })
        .await
        .map_err(join_error)?;

        self.port = Some(port);
        written?;
        Ok(())
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Serial
    }
}
