//! A logical canvas driven as a set of addressed panels.
//!
//! ## Bit packing
//!
//! Each panel column becomes one byte. Row 0 (top) is bit 0, row `h-1`
//! is bit `h-1`; unused high bits stay zero. A pixel is set when its
//! channel sum exceeds [`ON_THRESHOLD`](crate::canvas::ON_THRESHOLD).
//!
//! ```text
//! column x:   row 0 ─► bit 0 (LSB)
//!             row 1 ─► bit 1
//!              ...
//!             row 6 ─► bit 6
//!                      bit 7 = 0
//! ```

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use tracing::{debug, warn};

use crate::canvas::{Canvas, from_bit, is_on};
use crate::error::{FlipdotError, SendError, TransportError};
use crate::panel::{Panel, PanelMap};
use crate::transport::{ChannelKind, Client, Transport};

// ── Packing ──────────────────────────────────────────────────────

/// Pack the pixels under `panel` into one byte per column, left to right.
pub fn pack(canvas: &Canvas, panel: &Panel) -> Vec<u8> {
    (panel.x..panel.x + panel.width)
        .map(|x| {
            (0..panel.height.min(8)).rev().fold(0u8, |byte, y| {
                (byte << 1) | is_on(canvas.pixel(x, panel.y + y)) as u8
            })
        })
        .collect()
}

/// Expand column bytes back into a `width × height` black/white image.
///
/// Missing columns stay black; extra bytes are ignored.
pub fn unpack(payload: &[u8], width: u32, height: u32) -> Canvas {
    let mut image = Canvas::new(width, height);
    for x in 0..width {
        let byte = payload.get(x as usize).copied().unwrap_or(0);
        for y in 0..height.min(8) {
            if (byte >> y) & 0x01 == 1 {
                image.set_pixel(x, y, Rgb888::WHITE);
            }
        }
    }
    image
}

// ── Display ──────────────────────────────────────────────────────

/// A canvas, the panels that tile it and at most one connected link.
///
/// # Lifetime
///
/// [`connect`](Self::connect) opens the link (except TCP, which connects
/// per frame), [`send`](Self::send) pushes every panel, and
/// [`disconnect`](Self::disconnect) closes it again. Reconnecting closes
/// the previous link first.
#[derive(Debug)]
pub struct Display {
    canvas: Canvas,
    panels: PanelMap,
    client: Option<Client>,
}

impl Display {
    /// Create a display of `width × height` with an explicit panel map.
    ///
    /// The map is re-checked against these dimensions.
    pub fn new(width: u32, height: u32, panels: PanelMap) -> Result<Self, FlipdotError> {
        let panels = PanelMap::new(panels.iter().copied(), width, height)?;
        Ok(Self {
            canvas: Canvas::new(width, height),
            panels,
            client: None,
        })
    }

    /// One panel at address 1 spanning the whole canvas.
    pub fn single(width: u32, height: u32) -> Result<Self, FlipdotError> {
        Self::new(width, height, PanelMap::single(width, height)?)
    }

    /// Tile the canvas with equally sized panels.
    pub fn tiled(panel_size: (u32, u32), width: u32, height: u32) -> Result<Self, FlipdotError> {
        Self::new(width, height, PanelMap::tiled(panel_size, (width, height))?)
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn panels(&self) -> &PanelMap {
        &self.panels
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Kind of the connected link, if any.
    pub fn channel(&self) -> Option<ChannelKind> {
        self.client.as_ref().map(|c| c.kind())
    }

    /// Paint one panel, or the whole canvas when `address` is `None`,
    /// black (or white).
    pub fn reset(&mut self, address: Option<u8>, white: bool) -> Result<(), FlipdotError> {
        let color = if white { Rgb888::WHITE } else { Rgb888::BLACK };
        match address {
            Some(address) => {
                let p = self
                    .panels
                    .get(address)
                    .ok_or(FlipdotError::UnknownPanel(address))?;
                self.canvas.fill_rect(p.x, p.y, p.width, p.height, color);
            }
            None => self.canvas.fill(color),
        }
        Ok(())
    }

    /// Column bytes for one panel.
    pub fn to_bytes(&self, address: u8) -> Result<Vec<u8>, FlipdotError> {
        let panel = self
            .panels
            .get(address)
            .ok_or(FlipdotError::UnknownPanel(address))?;
        Ok(pack(&self.canvas, panel))
    }

    /// Replace the pixels of one panel with a black/white image decoded
    /// from its column bytes.
    pub fn write_panel(&mut self, address: u8, payload: &[u8]) -> Result<(), FlipdotError> {
        let panel = *self
            .panels
            .get(address)
            .ok_or(FlipdotError::UnknownPanel(address))?;
        let image = unpack(payload, panel.width, panel.height);
        self.canvas.paste(&image, panel.x, panel.y);
        Ok(())
    }

    /// Attach a link, opening it unless it is TCP.
    ///
    /// A previously connected link is disconnected first. If opening
    /// fails the display stays disconnected.
    pub async fn connect(&mut self, mut client: Client) -> Result<(), TransportError> {
        self.disconnect().await?;
        if client.kind() != ChannelKind::Tcp {
            client.open().await?;
        }
        debug!("display connected over {}", client.kind());
        self.client = Some(client);
        Ok(())
    }

    /// Close and drop the link. No-op when nothing is connected.
    pub async fn disconnect(&mut self) -> Result<(), TransportError> {
        match self.client.take() {
            Some(mut client) if client.kind() != ChannelKind::Tcp => client.close().await,
            _ => Ok(()),
        }
    }

    /// Push every panel to the link.
    ///
    /// Does nothing when disconnected. Every panel is attempted even if
    /// an earlier one fails; all failures come back together.
    pub async fn send(&mut self, refresh: bool) -> Result<(), SendError> {
        let Some(client) = self.client.as_mut() else {
            return Ok(());
        };

        let mut failures = SendError::default();
        for panel in self.panels.iter() {
            let bits = pack(&self.canvas, panel);
            if let Err(e) = client.send(panel.address, &bits, refresh).await {
                warn!("panel {} send failed: {e}", panel.address);
                failures.push(panel.address, e);
            }
        }
        failures.into_result()
    }
}

/// Binarize every pixel of a canvas to pure black or white.
pub fn binarize(canvas: &Canvas) -> Canvas {
    let mut out = Canvas::new(canvas.width(), canvas.height());
    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            out.set_pixel(x, y, from_bit(is_on(canvas.pixel(x, y))));
        }
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────
