//! Inverse multiplexer: one large logical canvas split across several
//! displays, each with its own link.
//!
//! Each sub-display sits at a placement offset. In landscape mode its
//! region of the mux canvas is `(x, y, w, h)` taken straight from the
//! offset and the sub-display size. In portrait mode the panels are
//! mounted a quarter turn from the logical canvas, so the region is
//! `(y, x, h, w)` and the crop is rotated 90° counter-clockwise before
//! it is pasted into the sub-display:
//!
//! ```text
//!  sub-display 28x56 at (0, 56)
//!  landscape region: x=0  y=56 w=28 h=56
//!  portrait region:  x=56 y=0  w=56 h=28  ──rotate ccw──► 28x56
//! ```
//!
//! A receiver restores the logical orientation with a clockwise
//! rotation. No mirroring is applied on either side.

use std::collections::BTreeMap;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use tracing::warn;

use crate::canvas::Canvas;
use crate::display::Display;
use crate::error::{FlipdotError, SendError, TransportError};
use crate::transport::Client;

/// A display and where it sits on the mux canvas.
#[derive(Debug)]
struct Placed {
    offset: (u32, u32),
    display: Display,
}

/// Several [`Display`]s driven from one canvas.
#[derive(Debug)]
pub struct MultiDisplay {
    canvas: Canvas,
    displays: BTreeMap<u8, Placed>,
    portrait: bool,
}

impl MultiDisplay {
    /// Build a mux of `width × height` from `(id, offset, display)`
    /// entries.
    ///
    /// Every sub-display region must fit inside the mux canvas and IDs
    /// must be unique.
    pub fn new<I>(width: u32, height: u32, displays: I, portrait: bool) -> Result<Self, FlipdotError>
    where
        I: IntoIterator<Item = (u8, (u32, u32), Display)>,
    {
        let mut mux = Self {
            canvas: Canvas::new(width, height),
            displays: BTreeMap::new(),
            portrait,
        };
        for (id, offset, display) in displays {
            if mux.displays.contains_key(&id) {
                return Err(FlipdotError::InvalidConfig(format!(
                    "duplicate display id {id}"
                )));
            }
            let placed = Placed { offset, display };
            let (x, y, w, h) = mux.region_of(&placed);
            if x as u64 + w as u64 > width as u64 || y as u64 + h as u64 > height as u64 {
                return Err(FlipdotError::InvalidConfig(format!(
                    "display {id} region ({x}, {y}) {w}x{h} exceeds the {width}x{height} mux canvas"
                )));
            }
            mux.displays.insert(id, placed);
        }
        let (bw, bh) = mux.bounding_box();
        if (bw, bh) != (width, height) {
            warn!("mux canvas {width}x{height} differs from display bounding box {bw}x{bh}");
        }
        Ok(mux)
    }

    fn region_of(&self, placed: &Placed) -> (u32, u32, u32, u32) {
        let (x, y) = placed.offset;
        let (w, h) = (placed.display.width(), placed.display.height());
        if self.portrait {
            (y, x, h, w)
        } else {
            (x, y, w, h)
        }
    }

    /// Region `(x, y, w, h)` of the mux canvas that feeds display `id`.
    pub fn region(&self, id: u8) -> Result<(u32, u32, u32, u32), FlipdotError> {
        let placed = self
            .displays
            .get(&id)
            .ok_or(FlipdotError::UnknownDisplay(id))?;
        Ok(self.region_of(placed))
    }

    /// Smallest `(width, height)` covering every sub-display region.
    pub fn bounding_box(&self) -> (u32, u32) {
        self.displays
            .values()
            .map(|p| {
                let (x, y, w, h) = self.region_of(p);
                (x + w, y + h)
            })
            .fold((0, 0), |(bw, bh), (r, b)| (bw.max(r), bh.max(b)))
    }

    pub fn portrait(&self) -> bool {
        self.portrait
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Sub-display IDs in ascending order.
    pub fn ids(&self) -> Vec<u8> {
        self.displays.keys().copied().collect()
    }

    pub fn display(&self, id: u8) -> Option<&Display> {
        self.displays.get(&id).map(|p| &p.display)
    }

    /// Crop the region of display `id` and orient it for that display.
    pub fn portion(&self, id: u8) -> Result<Canvas, FlipdotError> {
        let (x, y, w, h) = self.region(id)?;
        let crop = self.canvas.crop(x, y, w, h);
        Ok(if self.portrait { crop.rotate_ccw() } else { crop })
    }

    /// Connect one client per sub-display.
    ///
    /// The client IDs must match the display IDs exactly; otherwise
    /// nothing is connected. If a link fails to open, the ones already
    /// opened are disconnected again.
    pub async fn connect(&mut self, mut clients: BTreeMap<u8, Client>) -> Result<(), FlipdotError> {
        let ids = self.ids();
        let client_ids: Vec<u8> = clients.keys().copied().collect();
        if ids != client_ids {
            return Err(FlipdotError::ClientMismatch {
                displays: ids,
                clients: client_ids,
            });
        }

        let mut connected = Vec::with_capacity(ids.len());
        for id in ids {
            let (Some(client), Some(placed)) = (clients.remove(&id), self.displays.get_mut(&id))
            else {
                continue;
            };
            if let Err(e) = placed.display.connect(client).await {
                for done in connected {
                    if let Some(p) = self.displays.get_mut(&done) {
                        if let Err(e) = p.display.disconnect().await {
                            warn!("display {done} rollback disconnect failed: {e}");
                        }
                    }
                }
                return Err(e.into());
            }
            connected.push(id);
        }
        Ok(())
    }

    /// Disconnect every sub-display, reporting the first failure.
    pub async fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut first = Ok(());
        for placed in self.displays.values_mut() {
            if let Err(e) = placed.display.disconnect().await {
                if first.is_ok() {
                    first = Err(e);
                }
            }
        }
        first
    }

    /// Split the mux canvas into the sub-displays and send each.
    ///
    /// Failures of every sub-display are collected into one aggregate.
    pub async fn send(&mut self, refresh: bool) -> Result<(), SendError> {
        let mut failures = SendError::default();
        for id in self.ids() {
            let portion = match self.portion(id) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if let Some(placed) = self.displays.get_mut(&id) {
                placed.display.canvas_mut().paste(&portion, 0, 0);
                if let Err(e) = placed.display.send(refresh).await {
                    failures.extend(e);
                }
            }
        }
        failures.into_result()
    }

    /// Paint one sub-display region, or the whole mux canvas, black (or
    /// white).
    pub fn reset(&mut self, display: Option<u8>, white: bool) -> Result<(), FlipdotError> {
        let color = if white { Rgb888::WHITE } else { Rgb888::BLACK };
        match display {
            Some(id) => {
                let (x, y, w, h) = self.region(id)?;
                self.canvas.fill_rect(x, y, w, h, color);
            }
            None => self.canvas.fill(color),
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
