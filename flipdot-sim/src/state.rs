//! Shared simulator state.
//!
//! One [`Display`] holds the simulated dots in physical panel
//! coordinates. Every listener writes through [`SimulatorState::apply`]
//! and the render loop reads through [`SimulatorState::snapshot`]; both
//! take the same lock exactly once and never hold it across I/O.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use flipdot_core::{Canvas, Display, FlipdotError, Frame};

use crate::config::DisplayConfig;

const STOP_POLL: Duration = Duration::from_millis(50);

/// State shared by every listener and the render loop.
#[derive(Debug)]
pub struct SimulatorState {
    display: Mutex<Display>,
    portrait: bool,
    frames: AtomicU64,
    applied: AtomicU64,
    running: Arc<AtomicBool>,
}

impl SimulatorState {
    pub fn new(display: Display, portrait: bool) -> Self {
        Self {
            display: Mutex::new(display),
            portrait,
            frames: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build the simulated display described by `config`.
    pub fn from_config(config: &DisplayConfig) -> Result<Self, FlipdotError> {
        let display = Display::new(config.width, config.height, config.panel_map()?)?;
        Ok(Self::new(display, config.portrait))
    }

    // A panic while holding the lock leaves the canvas intact, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Display> {
        self.display.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write one panel payload. Unknown addresses are ignored.
    ///
    /// Returns whether the payload was applied.
    pub fn apply(&self, address: u8, payload: &[u8]) -> bool {
        match self.lock().write_panel(address, payload) {
            Ok(()) => {
                self.applied.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                debug!("ignoring frame: {e}");
                false
            }
        }
    }

    pub fn apply_frame(&self, frame: &Frame) -> bool {
        self.apply(frame.address(), frame.payload())
    }

    /// Reset one panel, or every panel, to black.
    pub fn refresh(&self, address: Option<u8>) -> Result<(), FlipdotError> {
        self.lock().reset(address, false)
    }

    /// Copy of the dots in viewing orientation.
    ///
    /// The copy is taken under the lock; the portrait rotation happens
    /// after it is released.
    pub fn snapshot(&self) -> Canvas {
        let physical = self.lock().canvas().clone();
        if self.portrait {
            physical.rotate_cw()
        } else {
            physical
        }
    }

    /// Copy of the dots as laid out on the panels.
    pub fn physical(&self) -> Canvas {
        self.lock().canvas().clone()
    }

    pub fn portrait(&self) -> bool {
        self.portrait
    }

    /// Count one render tick and return the new total.
    pub fn tick(&self) -> u64 {
        self.frames.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Number of payloads applied since start.
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Obtain a handle that stops every loop when set to `false`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Resolves once the simulator is no longer running.
    pub async fn stopped(&self) {
        while self.is_running() {
            tokio::time::sleep(STOP_POLL).await;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
