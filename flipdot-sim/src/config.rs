//! Configuration for the simulator.

use std::path::Path;

use serde::{Deserialize, Serialize};

use flipdot_core::{ChannelKind, FlipdotError, PANEL_HEIGHT, PANEL_WIDTH, Panel, PanelMap, SERIAL_BAUD};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Which listeners to start.
    pub listeners: Vec<ChannelKind>,
    /// Socket settings.
    pub network: NetworkConfig,
    /// Serial reader settings.
    pub serial: SerialConfig,
    /// Simulated panel layout.
    pub display: DisplayConfig,
    /// Terminal output.
    pub render: RenderConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind both listeners on.
    pub host: String,
    /// UDP port, one frame per datagram.
    pub udp_port: u16,
    /// TCP port, frames delimited by the end marker.
    pub tcp_port: u16,
    /// Idle time after which a TCP connection is dropped, in milliseconds.
    pub read_timeout_ms: u64,
}

/// Serial reader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub path: String,
    pub baud: u32,
    /// Read timeout in milliseconds; bounds how long shutdown waits.
    pub timeout_ms: u64,
}

/// Simulated display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Physical width in dots.
    pub width: u32,
    /// Physical height in dots.
    pub height: u32,
    pub panel_width: u32,
    pub panel_height: u32,
    /// Render rotated a quarter turn clockwise.
    pub portrait: bool,
    /// Explicit panel list; tiled from the panel size when empty.
    pub panels: Vec<Panel>,
}

/// Terminal render loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Tick interval in milliseconds.
    pub refresh_ms: u64,
    /// Draw to the terminal. Listeners still run when disabled.
    pub enabled: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Optional log file path. If empty, logs to stderr.
    pub file: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            listeners: vec![ChannelKind::Udp, ChannelKind::Tcp],
            network: NetworkConfig::default(),
            serial: SerialConfig::default(),
            display: DisplayConfig::default(),
            render: RenderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            udp_port: 9999,
            tcp_port: 9999,
            read_timeout_ms: 5000,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyUSB0".into(),
            baud: SERIAL_BAUD,
            timeout_ms: 200,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 28,
            height: 56,
            panel_width: PANEL_WIDTH,
            panel_height: PANEL_HEIGHT,
            portrait: false,
            panels: Vec::new(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 200,
            enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: String::new(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl SimConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default configuration to a file (for bootstrapping).
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    pub fn listens_on(&self, kind: ChannelKind) -> bool {
        self.listeners.contains(&kind)
    }
}

impl DisplayConfig {
    /// Build the validated panel map for this layout.
    pub fn panel_map(&self) -> Result<PanelMap, FlipdotError> {
        if self.panels.is_empty() {
            PanelMap::tiled(
                (self.panel_width, self.panel_height),
                (self.width, self.height),
            )
        } else {
            PanelMap::new(self.panels.iter().copied(), self.width, self.height)
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
