//! flipdot: entry point.
//!
//! ```text
//! flipdot "Hello"                     Show text over UDP to localhost:5000
//! flipdot -P tcp -i 10.0.0.5 "Hello"  Same over TCP
//! flipdot -P serial -u /dev/ttyUSB1   Run the demo over RS-485
//! flipdot --blink "Hi"                Blink the text
//! flipdot --stdout                    Print the panel layout first
//! flipdot --config <path>             Load a custom config TOML (mux setups)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flipdot_cli::animation::AnimationState;
use flipdot_cli::app::{self, Mode};
use flipdot_cli::config::DriverConfig;
use flipdot_cli::surface::Surface;
use flipdot_core::ChannelKind;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "flipdot", about = "Drive a flip-dot display")]
struct Cli {
    /// Text to display; runs the demo when empty.
    #[arg(default_value = "")]
    text: String,

    /// Communication protocol: udp, tcp or serial.
    #[arg(short = 'P', long)]
    protocol: Option<ChannelKind>,

    /// Port of the Ethernet to RS-485 bridge.
    #[arg(short, long)]
    port: Option<u16>,

    /// Address of the Ethernet to RS-485 bridge.
    #[arg(short = 'i', long = "ip")]
    host: Option<String>,

    /// Serial device of the USB to RS-485 adapter.
    #[arg(short = 'u', long = "usb")]
    device: Option<String>,

    /// Display width, a multiple of the panel width.
    #[arg(short = 'x', long)]
    width: Option<u32>,

    /// Display height, a multiple of the panel height.
    #[arg(short = 'y', long)]
    height: Option<u32>,

    /// Run the demo routine.
    #[arg(long)]
    demo: bool,

    /// Panels are in portrait orientation.
    #[arg(long)]
    portrait: bool,

    /// Blink the text.
    #[arg(long)]
    blink: bool,

    /// Print the panel layout.
    #[arg(long)]
    stdout: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "flipdot.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

impl Cli {
    /// Flags win over the config file.
    fn apply(&self, config: &mut DriverConfig) {
        if let Some(protocol) = self.protocol {
            config.transport.protocol = protocol;
        }
        if let Some(port) = self.port {
            config.transport.port = port;
        }
        if let Some(host) = &self.host {
            config.transport.host = host.clone();
        }
        if let Some(device) = &self.device {
            config.transport.device = device.clone();
        }
        if let Some(width) = self.width {
            config.display.width = width;
        }
        if let Some(height) = self.height {
            config.display.height = height;
        }
        if self.portrait {
            config.display.portrait = true;
        }
        if self.verbose {
            config.logging.level = "debug".into();
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&DriverConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = DriverConfig::load(&cli.config);
    cli.apply(&mut config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("flipdot v{}", env!("CARGO_PKG_VERSION"));

    let mut surface = app::connect(&config).await?;
    if cli.stdout {
        println!("{}", surface.describe());
    }

    let mode = Mode::select(&cli.text, cli.demo, cli.blink, &config);
    let mut state = AnimationState::new(config.pace());
    let running = Arc::new(AtomicBool::new(true));

    tokio::select! {
        _ = app::run(surface.as_mut(), &mode, &mut state, &running) => {}
        _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, shutting down"),
    }

    app::shutdown(surface.as_mut()).await?;
    Ok(())
}
