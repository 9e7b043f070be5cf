//! Simulator service core logic.
//!
//! Binds the configured listeners, runs the render loop on the calling
//! task and tears everything down once the stop flag clears.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use flipdot_core::{ChannelKind, FlipdotError};

use crate::config::SimConfig;
use crate::listener;
use crate::render::TerminalRenderer;
use crate::state::SimulatorState;

// ── SimulatorService ─────────────────────────────────────────────

/// The top-level simulator: shared state plus the units that feed and
/// draw it.
pub struct SimulatorService {
    config: SimConfig,
    state: Arc<SimulatorState>,
}

impl SimulatorService {
    /// Validate the display layout and create the service.
    pub fn new(config: SimConfig) -> Result<Self, FlipdotError> {
        let state = Arc::new(SimulatorState::from_config(&config.display)?);
        Ok(Self { config, state })
    }

    pub fn state(&self) -> Arc<SimulatorState> {
        Arc::clone(&self.state)
    }

    /// Obtain a handle that can be used to stop the service from another
    /// task.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.state.stop_handle()
    }

    pub fn stop(&self) {
        self.state.stop();
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Run until stopped.
    ///
    /// 1. Binds the UDP and TCP listeners (bind failures are fatal and
    ///    leave the service stopped).
    /// 2. Starts the serial reader on a blocking thread.
    /// 3. Renders every `refresh_ms` until the stop flag clears.
    /// 4. Waits for every listener to wind down.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let net = &self.config.network;
        let udp = if self.config.listens_on(ChannelKind::Udp) {
            Some(UdpSocket::bind((net.host.as_str(), net.udp_port)).await?)
        } else {
            None
        };
        let tcp = if self.config.listens_on(ChannelKind::Tcp) {
            Some(TcpListener::bind((net.host.as_str(), net.tcp_port)).await?)
        } else {
            None
        };

        self.state.start();
        let mut units: Vec<JoinHandle<()>> = Vec::new();

        if let Some(socket) = udp {
            let state = self.state();
            units.push(tokio::spawn(async move {
                if let Err(e) = listener::serve_udp(socket, state).await {
                    error!("udp listener failed: {e}");
                }
            }));
        }

        if let Some(tcp) = tcp {
            let state = self.state();
            let read_timeout = Duration::from_millis(net.read_timeout_ms);
            units.push(tokio::spawn(async move {
                if let Err(e) = listener::serve_tcp(tcp, state, read_timeout).await {
                    error!("tcp listener failed: {e}");
                }
            }));
        }

        if self.config.listens_on(ChannelKind::Serial) {
            let serial = self.config.serial.clone();
            let state = self.state();
            units.push(tokio::task::spawn_blocking(move || {
                if let Err(e) = listener::serve_serial(&serial, &state) {
                    error!("serial listener on {} failed: {e}", serial.path);
                }
            }));
        }

        let renderer = if self.config.render.enabled {
            match TerminalRenderer::new() {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!("terminal unavailable, rendering disabled: {e}");
                    None
                }
            }
        } else {
            None
        };
        let period = Duration::from_millis(self.config.render.refresh_ms.max(1));
        render_loop(&self.state, period, renderer).await;

        for unit in units {
            let _ = unit.await;
        }
        info!(
            "simulator stopped after {} frames, {} payloads applied",
            self.state.frames(),
            self.state.applied()
        );
        Ok(())
    }
}

/// Tick until the simulator stops, drawing a fresh snapshot each time.
///
/// The lock is only held while the snapshot is copied.
pub async fn render_loop(
    state: &SimulatorState,
    period: Duration,
    mut renderer: Option<TerminalRenderer>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    while state.is_running() {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = state.stopped() => break,
        }
        let frames = state.tick();
        let canvas = state.snapshot();
        let failed = match renderer.as_mut() {
            Some(r) => r.draw(&canvas, frames).err(),
            None => None,
        };
        if let Some(e) = failed {
            warn!("render failed, rendering disabled: {e}");
            renderer = None;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
