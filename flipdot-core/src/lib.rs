//! # flipdot-core
//!
//! Driver library for addressable flip-dot panels.
//!
//! This crate contains:
//! - **Wire format**: `Command`, `Frame`, `encode` / `validate` for the
//!   `0x80 cmd addr payload 0x8F` frame
//! - **Codec**: `FlipdotCodec` for framed stream I/O via `tokio_util`
//! - **Canvas**: `Canvas`, an RGB pixel grid implementing the
//!   `embedded-graphics` `DrawTarget`
//! - **Panels**: `Panel` and `PanelMap`, the validated panel layout
//! - **Transport**: `Transport` trait and the `Client` enum over UDP, TCP and serial
//! - **Display**: `Display`, a canvas plus panel map plus link
//! - **Mux**: `MultiDisplay`, one canvas split across several displays
//! - **Error**: `FlipdotError` and friends, `thiserror`-based

pub mod canvas;
pub mod codec;
pub mod command;
pub mod display;
pub mod error;
pub mod frame;
pub mod mux;
pub mod panel;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use canvas::{Canvas, ON_THRESHOLD};
pub use codec::FlipdotCodec;
pub use command::Command;
pub use display::{Display, binarize, pack, unpack};
pub use error::{FlipdotError, FrameError, SendError, TransportError};
pub use frame::{FRAME_END, FRAME_START, Frame, MAX_FRAME_LEN, encode, validate};
pub use mux::MultiDisplay;
pub use panel::{PANEL_HEIGHT, PANEL_WIDTH, Panel, PanelMap};
pub use transport::{
    ChannelKind, Client, Endpoint, SERIAL_BAUD, SerialClient, TcpClient, Transport, UdpClient,
};
