//! What the `flipdot` binary does once the surface is connected.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use flipdot_core::{ChannelKind, FlipdotError, SendError};

use crate::animation::{self, AnimationState, Font};
use crate::config::DriverConfig;
use crate::surface::Surface;

/// What to show in the main loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// The demo routine with transitions.
    Demo,
    /// Fixed text, scrolled when too wide.
    Text { text: String, font: Font },
    /// Text flashing on and off.
    Blink { text: String, times: usize },
}

impl Mode {
    /// Empty text or `--demo` selects the demo.
    pub fn select(text: &str, demo: bool, blink: bool, config: &DriverConfig) -> Self {
        if demo || text.is_empty() {
            Mode::Demo
        } else if blink {
            Mode::Blink {
                text: text.to_string(),
                times: config.animation.blinks,
            }
        } else {
            Mode::Text {
                text: text.to_string(),
                font: config.animation.font,
            }
        }
    }
}

/// Build and connect the surface described by `config`.
pub async fn connect(config: &DriverConfig) -> Result<Box<dyn Surface>, FlipdotError> {
    if config.uses_mux() {
        let (mut mux, clients) = config.build_mux()?;
        mux.connect(clients).await?;
        info!("connected {} sub-display(s)", mux.ids().len());
        Ok(Box::new(mux))
    } else {
        let mut display = config.build_display()?;
        display.connect(config.transport.client()).await?;
        if config.transport.protocol == ChannelKind::Tcp {
            info!("sending to {} (one connection per frame)", config.transport);
        } else {
            info!("connected to {}", config.transport);
        }
        Ok(Box::new(display))
    }
}

/// One round of `mode`.
pub async fn play(
    surface: &mut dyn Surface,
    mode: &Mode,
    state: &mut AnimationState,
) -> Result<(), SendError> {
    match mode {
        Mode::Demo => state.demo(surface).await,
        Mode::Text { text, font } => animation::display_text(surface, text, *font, state.pace()).await,
        Mode::Blink { text, times } => {
            animation::blink_text(surface, text, *times, state.pace()).await
        }
    }
}

/// Light every dot, then repeat `mode` until `running` clears.
///
/// Send failures are logged and the loop carries on. The surface is
/// left connected; see [`shutdown`].
pub async fn run(
    surface: &mut dyn Surface,
    mode: &Mode,
    state: &mut AnimationState,
    running: &Arc<AtomicBool>,
) {
    surface.clear(true);
    if let Err(e) = surface.flush(true).await {
        warn!("{e}");
    }

    while running.load(Ordering::SeqCst) {
        if let Err(e) = play(surface, mode, state).await {
            warn!("{e}");
        }
        state.pace().pause(1000).await;
    }
}

/// Blank the surface and close its links.
pub async fn shutdown(surface: &mut dyn Surface) -> Result<(), FlipdotError> {
    surface.clear(false);
    if let Err(e) = surface.flush(true).await {
        warn!("final blank failed: {e}");
    }
    surface.disconnect().await?;
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selection() {
        let cfg = DriverConfig::default();
        assert_eq!(Mode::select("", false, false, &cfg), Mode::Demo);
        assert_eq!(Mode::select("hi", true, false, &cfg), Mode::Demo);
        assert_eq!(
            Mode::select("hi", false, true, &cfg),
            Mode::Blink {
                text: "hi".into(),
                times: 3
            }
        );
        assert_eq!(
            Mode::select("hi", false, false, &cfg),
            Mode::Text {
                text: "hi".into(),
                font: Font::Small
            }
        );
    }
}
