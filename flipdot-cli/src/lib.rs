//! # flipdot-cli
//!
//! Command-line driver for flip-dot displays: shows text, blinks it or
//! runs a demo of transitions on one display or a mux of several.
//!
//! - **config**: `DriverConfig` TOML with transport, geometry and mux entries
//! - **surface**: the `Surface` trait shared by `Display` and `MultiDisplay`
//! - **animation**: text, wipes, curtain, dot and the transition round-robin
//! - **app**: connect, main loop and shutdown

pub mod animation;
pub mod app;
pub mod config;
pub mod surface;

pub use animation::{AnimationState, Font, Pace};
pub use config::DriverConfig;
pub use surface::Surface;
