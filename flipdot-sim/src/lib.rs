//! # flipdot-sim: flip-dot panel simulator
//!
//! Terminates the panel wire protocol in software and draws the dots in
//! the terminal, so drivers can be developed without hardware.
//!
//! ## Units
//!
//! - **UDP listener**: one frame per datagram.
//! - **TCP listener**: one task per connection, frames split on the end
//!   marker, idle connections dropped after a timeout.
//! - **Serial reader**: a blocking thread on an RS-485 adapter.
//! - **Render loop**: redraws a snapshot of the shared state every tick.
//!
//! All of them share one [`SimulatorState`](state::SimulatorState).

pub mod config;
pub mod listener;
pub mod render;
pub mod service;
pub mod state;

pub use config::SimConfig;
pub use service::SimulatorService;
pub use state::SimulatorState;
