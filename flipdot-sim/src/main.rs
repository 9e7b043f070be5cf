//! flipdot-sim: entry point.
//!
//! ```text
//! flipdot-sim                    Listen on UDP and TCP 9999, draw to the terminal
//! flipdot-sim 7000               Listen on port 7000 instead
//! flipdot-sim --listen serial    Read frames from the serial adapter only
//! flipdot-sim --config <path>    Load a custom config TOML
//! flipdot-sim --gen-config       Write default config to stdout
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flipdot_core::ChannelKind;
use flipdot_sim::config::SimConfig;
use flipdot_sim::service::SimulatorService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "flipdot-sim", about = "Flip-dot panel simulator")]
struct Cli {
    /// Port for both the UDP and TCP listeners.
    port: Option<u16>,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "flipdot-sim.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Address to bind the listeners on.
    #[arg(long)]
    host: Option<String>,

    /// Listeners to start (udp, tcp, serial), comma separated.
    #[arg(short, long, value_delimiter = ',')]
    listen: Vec<ChannelKind>,

    /// Serial device for the serial listener.
    #[arg(short, long)]
    device: Option<String>,

    /// Physical display width in dots.
    #[arg(short = 'x', long)]
    width: Option<u32>,

    /// Physical display height in dots.
    #[arg(short = 'y', long)]
    height: Option<u32>,

    /// Panels are mounted in portrait orientation.
    #[arg(long)]
    portrait: bool,

    /// Do not draw; only log.
    #[arg(long)]
    no_render: bool,
}

impl Cli {
    /// Flags win over the config file.
    fn apply(&self, config: &mut SimConfig) {
        if let Some(port) = self.port {
            config.network.udp_port = port;
            config.network.tcp_port = port;
        }
        if let Some(host) = &self.host {
            config.network.host = host.clone();
        }
        if !self.listen.is_empty() {
            config.listeners = self.listen.clone();
        }
        if let Some(device) = &self.device {
            config.serial.path = device.clone();
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
        if self.no_render {
            config.render.enabled = false;
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&SimConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = SimConfig::load(&cli.config);
    cli.apply(&mut config);

    // Logs go to stderr or a file so they do not tear the drawing on
    // stdout.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.logging.file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }

    info!("flipdot-sim v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "display {}x{}{}",
        config.display.width,
        config.display.height,
        if config.display.portrait { " (portrait)" } else { "" }
    );
    info!("listeners: {:?}", config.listeners);

    let service = SimulatorService::new(config)?;
    let stop = service.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    service.run().await?;

    Ok(())
}
