//! Wire frame encoding and validation.
//!
//! ## Wire format
//!
//! ```text
//! start:    u8   (0x80)
//! command:  u8   (0x81..=0x86, see [`Command`])
//! address:  u8   (panel address)
//! payload:  [u8] (112, 28 or 56 bytes, implied by `command`)
//! end:      u8   (0x8F)
//! ```
//!
//! The payload length is never carried on the wire; a frame is always
//! exactly `payload_len + 4` bytes. Everything here is pure: no I/O.

use crate::command::Command;
use crate::error::{FlipdotError, FrameError};

// ── Constants ────────────────────────────────────────────────────

/// First byte of every frame.
pub const FRAME_START: u8 = 0x80;

/// Last byte of every frame.
pub const FRAME_END: u8 = 0x8F;

/// Start, command, address and end bytes.
pub const FRAME_OVERHEAD: usize = 4;

/// Size of the largest frame (112-byte payload).
pub const MAX_FRAME_LEN: usize = 112 + FRAME_OVERHEAD;

// ── Frame ────────────────────────────────────────────────────────

/// One complete wire message addressed to a single panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    address: u8,
    payload: Vec<u8>,
}

impl Frame {
    /// Build a frame for `address` carrying `payload`.
    ///
    /// The command is chosen from the payload length and `refresh`;
    /// lengths other than 112, 28 and 56 are a configuration error.
    pub fn new(address: u8, payload: Vec<u8>, refresh: bool) -> Result<Self, FlipdotError> {
        let command = Command::for_payload(payload.len(), refresh)
            .ok_or(FlipdotError::UnsupportedPayloadLength(payload.len()))?;
        Ok(Self {
            command,
            address,
            payload,
        })
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the frame, keeping only the payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn refresh(&self) -> bool {
        self.command.refresh()
    }

    /// Total length on the wire.
    pub fn len(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    /// Frames always carry a payload.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Serialize to `[start, command, address, payload.., end]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        buf.push(FRAME_START);
        buf.push(self.command.code());
        buf.push(self.address);
        buf.extend_from_slice(&self.payload);
        buf.push(FRAME_END);
        buf
    }
}

// ── Free functions ───────────────────────────────────────────────

/// Encode a panel payload into its serialized frame.
pub fn encode(address: u8, bits: &[u8], refresh: bool) -> Result<Vec<u8>, FlipdotError> {
    Ok(Frame::new(address, bits.to_vec(), refresh)?.to_bytes())
}

/// Validate a raw frame and extract its contents.
///
/// Checks run in wire order: start marker, command code, total length
/// for that command, end marker. The first failing check decides the
/// error.
pub fn validate(raw: &[u8]) -> Result<Frame, FrameError> {
    match raw.first() {
        Some(&FRAME_START) => {}
        _ => return Err(FrameError::MissingStart),
    }

    let command = match raw.get(1) {
        Some(&code) => Command::try_from(code)?,
        None => {
            return Err(FrameError::LengthMismatch {
                expected: FRAME_OVERHEAD,
                actual: raw.len(),
            });
        }
    };

    let expected = command.payload_len() + FRAME_OVERHEAD;
    if raw.len() != expected {
        return Err(FrameError::LengthMismatch {
            expected,
            actual: raw.len(),
        });
    }

    if raw[expected - 1] != FRAME_END {
        return Err(FrameError::MissingEnd);
    }

    Ok(Frame {
        command,
        address: raw[2],
        payload: raw[3..expected - 1].to_vec(),
    })
}

// ── Tests ────────────────────────────────────────────────────────
