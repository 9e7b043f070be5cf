//! Domain-specific error types for flip-dot displays.
//!
//! Configuration mistakes, malformed frames and link failures each get
//! their own enum so callers can decide whether to abort, drop or report.
//! No panics on invalid input.

use thiserror::Error;

// ── FlipdotError ─────────────────────────────────────────────────

/// The canonical error type for display composition and driving.
#[derive(Debug, Error)]
pub enum FlipdotError {
    // ── Configuration Errors ─────────────────────────────────────
    /// A panel is not exactly as tall as the wire layout allows.
    #[error("panel {address} is {height} rows tall, expected {expected}")]
    PanelHeight {
        address: u8,
        height: u32,
        expected: u32,
    },

    /// Two panels of one display cover the same pixels.
    #[error("panel {first} overlaps panel {second}")]
    PanelOverlap { first: u8, second: u8 },

    /// A panel extends past the canvas edge.
    #[error("panel {address} lies outside the {width}x{height} canvas")]
    PanelOutOfBounds { address: u8, width: u32, height: u32 },

    /// A panel address that is not part of the panel map.
    #[error("unknown panel address {0}")]
    UnknownPanel(u8),

    /// A sub-display ID that is not part of the mux.
    #[error("unknown display id {0}")]
    UnknownDisplay(u8),

    /// No command exists for a payload of this length.
    #[error("unsupported payload length: {0} bytes")]
    UnsupportedPayloadLength(usize),

    /// The supplied transports do not match the sub-displays one to one.
    #[error("client mismatch: displays {displays:?}, clients {clients:?}")]
    ClientMismatch { displays: Vec<u8>, clients: Vec<u8> },

    /// Any other configuration inconsistency.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Wrapped Errors ───────────────────────────────────────────
    /// An inbound frame failed validation.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The transport refused or failed an operation.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// One or more panels failed during a broadcast.
    #[error(transparent)]
    Send(#[from] SendError),

    /// The I/O layer reported an error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// ── FrameError ───────────────────────────────────────────────────

/// Why an inbound frame was rejected.
///
/// The `Display` text is the short diagnostic category printed by the
/// simulator for every dropped frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// First byte is not the start marker.
    #[error("no start")]
    MissingStart,

    /// Second byte is not one of the six command codes.
    #[error("not right command")]
    UnknownCommand(u8),

    /// Frame length does not match the payload class of its command.
    #[error("bad length {actual} (expected {expected})")]
    LengthMismatch { expected: usize, actual: usize },

    /// Last byte is not the end marker.
    #[error("no end")]
    MissingEnd,
}

// ── TransportError ───────────────────────────────────────────────

/// Failure of a single transport operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `send` was called on a persistent transport that is not open.
    #[error("transport is not open")]
    NotOpen,

    /// Socket or stream error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial device could not be opened or configured.
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// The payload could not be framed.
    #[error("cannot encode payload of {0} bytes")]
    Encode(usize),
}

// ── SendError ────────────────────────────────────────────────────

/// Aggregate result of a best-effort broadcast to every panel.
///
/// Each entry pairs a panel address with the error its send produced.
/// Panels not listed were transmitted successfully.
#[derive(Debug, Default, Error)]
#[error("{} panel send(s) failed: {}", .failures.len(), describe(.failures))]
pub struct SendError {
    pub failures: Vec<(u8, TransportError)>,
}

impl SendError {
    /// Record one failed panel.
    pub fn push(&mut self, address: u8, err: TransportError) {
        self.failures.push((address, err));
    }

    /// `true` when no panel failed.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Addresses of the panels that failed, in the order they were tried.
    pub fn addresses(&self) -> Vec<u8> {
        self.failures.iter().map(|(a, _)| *a).collect()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), SendError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Fold another aggregate into this one.
    pub fn extend(&mut self, other: SendError) {
        self.failures.extend(other.failures);
    }
}

fn describe(failures: &[(u8, TransportError)]) -> String {
    failures
        .iter()
        .map(|(address, e)| format!("panel {address}: {e}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_error_diagnostics() {
        assert_eq!(FrameError::MissingStart.to_string(), "no start");
        assert_eq!(FrameError::UnknownCommand(0x90).to_string(), "not right command");
        assert!(
            FrameError::LengthMismatch {
                expected: 32,
                actual: 10
            }
            .to_string()
            .starts_with("bad length")
        );
        assert_eq!(FrameError::MissingEnd.to_string(), "no end");
    }

    #[test]
    fn send_error_aggregates() {
        let mut agg = SendError::default();
        assert!(agg.is_empty());
        agg.push(2, TransportError::NotOpen);
        agg.push(5, TransportError::Encode(3));
        assert_eq!(agg.addresses(), vec![2, 5]);
        let msg = agg.to_string();
        assert!(msg.contains("2 panel send(s) failed"));
        assert!(msg.contains("panel 5"));
        assert!(agg.into_result().is_err());
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: FlipdotError = io_err.into();
        assert!(matches!(e, FlipdotError::Io(_)));

        let e: FlipdotError = FrameError::MissingEnd.into();
        assert!(e.to_string().contains("no end"));
    }
}
