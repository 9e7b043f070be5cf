//! Stream framing for byte-oriented links (TCP, serial).
//!
//! Frames carry no length prefix, so a candidate frame is everything up
//! to the end marker. The search starts after the address byte, which may
//! itself be `0x8F`. Each candidate is validated before it is handed out,
//! so a reader sees `Ok(frame)` or the reason the bytes were dropped and
//! keeps going.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{FlipdotError, FrameError};
use crate::frame::{self, FRAME_END, FRAME_START, Frame, MAX_FRAME_LEN};

/// Index of the first byte that may be the end marker (after start,
/// command and address).
const TRAILER_SEARCH_OFFSET: usize = 3;

/// Decodes trailer-delimited frames and encodes [`Frame`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlipdotCodec;

impl FlipdotCodec {
    pub fn new() -> Self {
        Self
    }

    /// Length of the next candidate frame in `src`, if complete.
    fn candidate_len(src: &[u8]) -> Option<usize> {
        if src.is_empty() {
            return None;
        }

        // Garbage before a frame: cut at the next start marker or at the
        // first end marker so the following frame survives.
        if src[0] != FRAME_START {
            return src
                .iter()
                .enumerate()
                .find_map(|(i, &b)| match b {
                    FRAME_START => Some(i),
                    FRAME_END => Some(i + 1),
                    _ => None,
                })
                .or_else(|| (src.len() > MAX_FRAME_LEN).then_some(src.len()));
        }

        if src.len() <= TRAILER_SEARCH_OFFSET {
            return None;
        }
        if let Some(pos) = src[TRAILER_SEARCH_OFFSET..]
            .iter()
            .position(|&b| b == FRAME_END)
        {
            return Some(TRAILER_SEARCH_OFFSET + pos + 1);
        }

        // No end marker within the largest possible frame.
        if src.len() > MAX_FRAME_LEN {
            return Some(src.len());
        }
        None
    }
}

impl Decoder for FlipdotCodec {
    type Item = Result<Frame, FrameError>;
    type Error = FlipdotError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match Self::candidate_len(src) {
            Some(len) => {
                let raw = src.split_to(len);
                Ok(Some(frame::validate(&raw)))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // Peer went away mid-frame: report what was left.
        let raw = src.split_to(src.len());
        Ok(Some(frame::validate(&raw)))
    }
}

impl Encoder<Frame> for FlipdotCodec {
    type Error = FlipdotError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.extend_from_slice(&item.to_bytes());
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
