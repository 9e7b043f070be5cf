//! Configuration for the `flipdot` driver.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use flipdot_core::{
    Client, Display, Endpoint, FlipdotError, MultiDisplay, PANEL_HEIGHT, PANEL_WIDTH,
};

use crate::animation::{Font, Pace};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Link to a single display.
    pub transport: Endpoint,
    /// Geometry of the display, or of every mux sub-display's panels.
    pub display: DisplayConfig,
    /// Animation timing and fonts.
    pub animation: AnimationConfig,
    /// Sub-displays driven as one canvas. Overrides `transport` when
    /// not empty.
    pub mux: Vec<MuxEntry>,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Display geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub panel_width: u32,
    pub panel_height: u32,
    /// Panels are mounted a quarter turn from the logical canvas.
    pub portrait: bool,
}

/// Animation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Pause multiplier; 1.0 is real time, 0.5 twice as fast.
    pub tempo: f64,
    /// Font for text given on the command line.
    pub font: Font,
    /// Blinks per round in `--blink` mode.
    pub blinks: usize,
}

/// One sub-display of a mux.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxEntry {
    pub id: u8,
    /// Placement offset `(x, y)` on the mux canvas.
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    /// Physical size of this sub-display.
    pub width: u32,
    pub height: u32,
    pub transport: Endpoint,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            transport: Endpoint::default(),
            display: DisplayConfig::default(),
            animation: AnimationConfig::default(),
            mux: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 28,
            height: 14,
            panel_width: PANEL_WIDTH,
            panel_height: PANEL_HEIGHT,
            portrait: false,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tempo: 1.0,
            font: Font::Small,
            blinks: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl DriverConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::debug!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn pace(&self) -> Pace {
        Pace(self.animation.tempo)
    }

    fn panel_size(&self) -> (u32, u32) {
        (self.display.panel_width, self.display.panel_height)
    }

    /// The single display described by `[display]`, disconnected.
    pub fn build_display(&self) -> Result<Display, FlipdotError> {
        Display::tiled(self.panel_size(), self.display.width, self.display.height)
    }

    /// The mux described by `[[mux]]` (or, for a portrait single
    /// display, a one-entry mux), disconnected, with one client per
    /// sub-display.
    pub fn build_mux(&self) -> Result<(MultiDisplay, BTreeMap<u8, Client>), FlipdotError> {
        let portrait = self.display.portrait;
        let entries: Vec<MuxEntry> = if self.mux.is_empty() {
            vec![MuxEntry {
                id: 1,
                x: 0,
                y: 0,
                width: self.display.width,
                height: self.display.height,
                transport: self.transport.clone(),
            }]
        } else {
            self.mux.clone()
        };

        let (mut width, mut height) = (0, 0);
        for e in &entries {
            let (right, bottom) = if portrait {
                (e.y + e.height, e.x + e.width)
            } else {
                (e.x + e.width, e.y + e.height)
            };
            width = width.max(right);
            height = height.max(bottom);
        }

        let mut displays = Vec::with_capacity(entries.len());
        let mut clients = BTreeMap::new();
        for e in entries {
            let display = Display::tiled(self.panel_size(), e.width, e.height)?;
            displays.push((e.id, (e.x, e.y), display));
            if clients.insert(e.id, e.transport.client()).is_some() {
                return Err(FlipdotError::InvalidConfig(format!(
                    "duplicate mux id {}",
                    e.id
                )));
            }
        }
        let mux = MultiDisplay::new(width, height, displays, portrait)?;
        Ok((mux, clients))
    }

    /// Whether a mux is needed: explicit `[[mux]]` entries or a portrait
    /// display.
    pub fn uses_mux(&self) -> bool {
        !self.mux.is_empty() || self.display.portrait
    }
}

// ── Tests ────────────────────────────────────────────────────────
