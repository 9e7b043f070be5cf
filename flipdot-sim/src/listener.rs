//! Frame sources: UDP datagrams, TCP streams and a serial line.
//!
//! Every source validates what it receives and hands good frames to
//! [`SimulatorState::apply_frame`]. A rejected frame is logged with its
//! diagnostic category and the source keeps going.
//!
//! | Source | Framing                          | Unit of work             |
//! |--------|----------------------------------|--------------------------|
//! | UDP    | one frame per datagram           | one task for the socket  |
//! | TCP    | end-marker delimited, any number | one task per connection  |
//! | Serial | end-marker delimited             | one blocking thread      |

use std::io::{self, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio_util::codec::Decoder;
use tracing::{debug, info, warn};

use flipdot_core::{FlipdotCodec, FlipdotError, Frame, FrameError, validate};

use crate::config::SerialConfig;
use crate::state::SimulatorState;

/// Largest datagram read; anything longer is not a frame anyway.
const DATAGRAM_BUF: usize = 1024;

/// Apply a decoded frame or log why it was dropped.
fn handle(state: &SimulatorState, source: &dyn std::fmt::Display, item: Result<Frame, FrameError>) {
    match item {
        Ok(frame) => {
            // Unknown addresses are logged by the state.
            state.apply_frame(&frame);
        }
        Err(e) => warn!("{source}: {e}"),
    }
}

// ── UDP ──────────────────────────────────────────────────────────

/// Receive datagrams until the simulator stops.
pub async fn serve_udp(socket: UdpSocket, state: Arc<SimulatorState>) -> io::Result<()> {
    info!("udp listener on {}", socket.local_addr()?);
    let mut buf = [0u8; DATAGRAM_BUF];

    while state.is_running() {
        let received = tokio::select! {
            r = socket.recv_from(&mut buf) => r,
            _ = state.stopped() => break,
        };
        match received {
            Ok((len, peer)) => handle(&state, &peer, validate(&buf[..len])),
            Err(e) => warn!("udp receive error: {e}"),
        }
    }
    debug!("udp listener stopped");
    Ok(())
}

// ── TCP ──────────────────────────────────────────────────────────

/// Accept connections until the simulator stops, one task each.
pub async fn serve_tcp(
    listener: TcpListener,
    state: Arc<SimulatorState>,
    read_timeout: Duration,
) -> io::Result<()> {
    info!("tcp listener on {}", listener.local_addr()?);

    while state.is_running() {
        let accept = tokio::select! {
            r = listener.accept() => r,
            _ = state.stopped() => break,
        };
        let (stream, peer) = match accept {
            Ok(pair) => pair,
            Err(e) => {
                warn!("accept error: {e}");
                continue;
            }
        };
        debug!("tcp connection from {peer}");
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            serve_connection(stream, peer, state, read_timeout).await;
        });
    }
    debug!("tcp listener stopped");
    Ok(())
}

/// Read frames from one connection until EOF, an I/O error, a read
/// that stays quiet longer than `read_timeout` or shutdown.
///
/// The timeout covers each read, not each frame, so a slow sender that
/// keeps bytes coming is never cut off mid-frame.
pub async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: Arc<SimulatorState>,
    read_timeout: Duration,
) {
    let mut codec = FlipdotCodec::new();
    let mut buf = BytesMut::with_capacity(DATAGRAM_BUF);

    loop {
        let read = tokio::select! {
            r = tokio::time::timeout(read_timeout, stream.read_buf(&mut buf)) => r,
            _ = state.stopped() => break,
        };
        let eof = match read {
            Ok(Ok(0)) => true,
            Ok(Ok(_)) => false,
            Ok(Err(e)) => {
                warn!("{peer}: read error: {e}");
                break;
            }
            Err(_) => {
                debug!("{peer}: idle for {read_timeout:?}, closing");
                break;
            }
        };
        if let Err(e) = drain(&mut codec, &mut buf, &state, &peer, eof) {
            warn!("{peer}: {e}");
            break;
        }
        if eof {
            break;
        }
    }
    debug!("tcp connection from {peer} closed");
}

/// Hand every complete frame in `buf` to the state. At end of input the
/// leftover bytes count as one last candidate.
fn drain(
    codec: &mut FlipdotCodec,
    buf: &mut BytesMut,
    state: &SimulatorState,
    source: &dyn std::fmt::Display,
    eof: bool,
) -> Result<(), FlipdotError> {
    loop {
        let item = if eof {
            codec.decode_eof(buf)?
        } else {
            codec.decode(buf)?
        };
        match item {
            Some(item) => handle(state, source, item),
            None => return Ok(()),
        }
    }
}

// ── Serial ───────────────────────────────────────────────────────

/// Read the serial line on the calling thread until the simulator stops.
///
/// Blocking; run it on `spawn_blocking`. The port read timeout bounds
/// how long a stop request waits.
pub fn serve_serial(config: &SerialConfig, state: &SimulatorState) -> Result<(), serialport::Error> {
    let mut port = serialport::new(&config.path, config.baud)
        .timeout(Duration::from_millis(config.timeout_ms))
        .open()?;
    info!("serial listener on {} at {} baud", config.path, config.baud);
    read_frames(&mut port, &config.path, state)?;
    debug!("serial listener stopped");
    Ok(())
}

/// Decode frames from any blocking byte source until it ends or the
/// simulator stops. Read timeouts just re-check the stop flag.
pub fn read_frames<R: Read>(source: &mut R, name: &str, state: &SimulatorState) -> io::Result<()> {
    let mut codec = FlipdotCodec::new();
    let mut buf = BytesMut::with_capacity(DATAGRAM_BUF);
    let mut chunk = [0u8; 256];

    while state.is_running() {
        match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
        drain(&mut codec, &mut buf, state, &name, false)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    }
    drain(&mut codec, &mut buf, state, &name, true)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use flipdot_core::encode;

    fn running_state() -> SimulatorState {
        let state = SimulatorState::from_config(&DisplayConfig::default()).unwrap();
        state.start();
        state
    }

    #[test]
    fn byte_stream_applies_good_frames() {
        let state = running_state();
        let mut bytes = encode(1, &[0x7F; 28], true).unwrap();
        bytes.extend([0x80, 0x99, 0x01, 0x8F]);
        bytes.extend(encode(3, &[0x01; 28], false).unwrap());
        bytes.extend(encode(200, &[0x7F; 28], false).unwrap());

        read_frames(&mut bytes.as_slice(), "test", &state).unwrap();

        // Panel 1 fully on, panel 3 top row on, the bad frame and the
        // unknown panel dropped.
        assert_eq!(state.applied(), 2);
        assert_eq!(state.snapshot().count_on(), 28 * 7 + 28);
    }

    #[test]
    fn trailing_partial_frame_is_dropped() {
        let state = running_state();
        let mut bytes = encode(2, &[0x7F; 28], true).unwrap();
        bytes.extend([0x80, 0x84, 0x02, 0x7F]);

        read_frames(&mut bytes.as_slice(), "test", &state).unwrap();
        assert_eq!(state.applied(), 1);
    }

    #[test]
    fn stopped_state_reads_nothing() {
        let state = SimulatorState::from_config(&DisplayConfig::default()).unwrap();
        let bytes = encode(1, &[0x7F; 28], true).unwrap();
        read_frames(&mut bytes.as_slice(), "test", &state).unwrap();
        assert_eq!(state.applied(), 0);
    }
}
