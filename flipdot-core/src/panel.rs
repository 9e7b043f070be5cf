//! Panel geometry and the address → panel map of a display.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FlipdotError;

/// Rows per panel. The per-column byte layout only has room for this
/// many dots, so any other height is rejected.
pub const PANEL_HEIGHT: u32 = 7;

/// Width of the common 28×7 panel.
pub const PANEL_WIDTH: u32 = 28;

// ── Panel ────────────────────────────────────────────────────────

/// One physical tile: an address and an axis-aligned rectangle in
/// canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Panel {
    pub address: u8,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Panel {
    pub fn new(address: u8, (x, y): (u32, u32), (width, height): (u32, u32)) -> Self {
        Self {
            address,
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Whether the two rectangles share at least one pixel.
    pub fn overlaps(&self, other: &Panel) -> bool {
        (self.x as u64) < other.right()
            && (other.x as u64) < self.right()
            && (self.y as u64) < other.bottom()
            && (other.y as u64) < self.bottom()
    }
}

// ── PanelMap ─────────────────────────────────────────────────────

/// Validated, address-ordered set of panels covering one canvas.
///
/// Invariants checked at construction:
/// - every panel is [`PANEL_HEIGHT`] rows tall,
/// - every panel lies inside the canvas,
/// - no two panels overlap,
/// - addresses are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelMap {
    panels: BTreeMap<u8, Panel>,
}

impl PanelMap {
    /// Validate an explicit list of panels against a `width × height`
    /// canvas.
    pub fn new<I>(panels: I, width: u32, height: u32) -> Result<Self, FlipdotError>
    where
        I: IntoIterator<Item = Panel>,
    {
        let mut map = BTreeMap::new();
        for panel in panels {
            if panel.height != PANEL_HEIGHT {
                return Err(FlipdotError::PanelHeight {
                    address: panel.address,
                    height: panel.height,
                    expected: PANEL_HEIGHT,
                });
            }
            if panel.width == 0 || panel.right() > width as u64 || panel.bottom() > height as u64
            {
                return Err(FlipdotError::PanelOutOfBounds {
                    address: panel.address,
                    width,
                    height,
                });
            }
            if map.contains_key(&panel.address) {
                return Err(FlipdotError::InvalidConfig(format!(
                    "duplicate panel address {}",
                    panel.address
                )));
            }
            if let Some(other) = map.values().find(|p: &&Panel| p.overlaps(&panel)) {
                return Err(FlipdotError::PanelOverlap {
                    first: other.address,
                    second: panel.address,
                });
            }
            map.insert(panel.address, panel);
        }
        Ok(Self { panels: map })
    }

    /// One panel at address 1 covering the whole canvas.
    pub fn single(width: u32, height: u32) -> Result<Self, FlipdotError> {
        Self::new([Panel::new(1, (0, 0), (width, height))], width, height)
    }

    /// Tile a `width × height` canvas with `panel_width × panel_height`
    /// panels.
    ///
    /// Addresses start at 1 and advance along a row of panels before
    /// moving down to the next row. Only whole panels are placed.
    pub fn tiled(
        (panel_width, panel_height): (u32, u32),
        (width, height): (u32, u32),
    ) -> Result<Self, FlipdotError> {
        if panel_width == 0 || panel_height == 0 {
            return Err(FlipdotError::InvalidConfig(
                "panel size must be non-zero".into(),
            ));
        }
        let cols = width / panel_width;
        let rows = height / panel_height;
        if cols == 0 || rows == 0 {
            return Err(FlipdotError::InvalidConfig(format!(
                "{width}x{height} canvas cannot hold a {panel_width}x{panel_height} panel"
            )));
        }
        if (cols * rows) as usize > u8::MAX as usize {
            return Err(FlipdotError::InvalidConfig(format!(
                "{} panels exceed the address space",
                cols * rows
            )));
        }

        let mut panels = Vec::with_capacity((cols * rows) as usize);
        let mut address: u8 = 1;
        for row in 0..rows {
            for col in 0..cols {
                panels.push(Panel::new(
                    address,
                    (col * panel_width, row * panel_height),
                    (panel_width, panel_height),
                ));
                address = address.wrapping_add(1);
            }
        }
        Self::new(panels, width, height)
    }

    pub fn get(&self, address: u8) -> Option<&Panel> {
        self.panels.get(&address)
    }

    pub fn contains(&self, address: u8) -> bool {
        self.panels.contains_key(&address)
    }

    /// Panels in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Panel> {
        self.panels.values()
    }

    pub fn addresses(&self) -> Vec<u8> {
        self.panels.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

impl std::fmt::Display for PanelMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for p in self.iter() {
            writeln!(
                f,
                "{:>3}: ({}, {}) {}x{}",
                p.address, p.x, p.y, p.width, p.height
            )?;
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_rows_then_columns() {
        let map = PanelMap::tiled((28, 7), (56, 14)).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map.get(1).unwrap().origin(), (0, 0));
        assert_eq!(map.get(2).unwrap().origin(), (28, 0));
        assert_eq!(map.get(3).unwrap().origin(), (0, 7));
        assert_eq!(map.get(4).unwrap().origin(), (28, 7));
    }

    #[test]
    fn tiles_only_whole_panels() {
        let map = PanelMap::tiled((28, 7), (30, 20)).unwrap();
        assert_eq!(map.addresses(), vec![1, 2]);
    }

    #[test]
    fn single_covers_canvas() {
        let map = PanelMap::single(28, 7).unwrap();
        assert_eq!(map.get(1).unwrap().size(), (28, 7));
        assert!(matches!(
            PanelMap::single(28, 14),
            Err(FlipdotError::PanelHeight { height: 14, .. })
        ));
    }

    #[test]
    fn rejects_overlap() {
        let panels = [
            Panel::new(1, (0, 0), (28, 7)),
            Panel::new(2, (27, 0), (28, 7)),
        ];
        assert!(matches!(
            PanelMap::new(panels, 56, 7),
            Err(FlipdotError::PanelOverlap { first: 1, second: 2 })
        ));
    }

    #[test]
    fn rejects_out_of_bounds() {
        let panels = [Panel::new(1, (0, 1), (28, 7))];
        assert!(matches!(
            PanelMap::new(panels, 28, 7),
            Err(FlipdotError::PanelOutOfBounds { address: 1, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_address() {
        let panels = [
            Panel::new(1, (0, 0), (28, 7)),
            Panel::new(1, (0, 7), (28, 7)),
        ];
        assert!(matches!(
            PanelMap::new(panels, 28, 14),
            Err(FlipdotError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_empty_tiling() {
        assert!(PanelMap::tiled((28, 7), (10, 7)).is_err());
        assert!(PanelMap::tiled((0, 7), (28, 7)).is_err());
    }

    #[test]
    fn adjacent_panels_do_not_overlap() {
        let a = Panel::new(1, (0, 0), (28, 7));
        let b = Panel::new(2, (28, 0), (28, 7));
        let c = Panel::new(3, (0, 7), (28, 7));
        assert!(!a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.overlaps(&a));
    }
}
