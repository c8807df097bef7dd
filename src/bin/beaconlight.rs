use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossbeam::channel;
use tracing::info;
use tracing_subscriber::EnvFilter;

use beaconlight_rs::{config, listener, Pipeline};

const DEFAULT_CONFIG: &str = "beaconlight.yaml";

#[derive(Parser, Debug)]
#[command(name = "beaconlight", version)]
#[command(
    about = "Drive peripheral light strips from beacon proximity.",
    after_help = "Messages are JSON objects, one per line on stdin or one per datagram:\n  {\"type\":\"observation\",\"name\":\"PI-B3-27\",\"rssi\":-60,\"distance\":1.2}\n  {\"type\":\"brightness\",\"value\":10}\n  {\"type\":\"maxDistance\",\"value\":4.5}\n  {\"type\":\"scan\",\"enabled\":true}"
)]
struct Cli {
    /// Config file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial brightness
    #[arg(long)]
    brightness: Option<u32>,

    /// Initial max distance
    #[arg(long)]
    max_distance: Option<f64>,

    /// Start with scanning enabled
    #[arg(long)]
    scan: bool,

    /// Accept JSON messages on this UDP address
    #[arg(long)]
    udp: Option<String>,

    /// Do not read messages from standard input
    #[arg(long)]
    no_stdin: bool,

    /// Use a fixed local address instead of probing
    #[arg(long)]
    local_address: Option<Ipv4Addr>,

    /// Peripheral UDP port
    #[arg(long)]
    port: Option<u16>,
}

fn load_config(path: Option<&Path>) -> Result<config::Root> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => {
            info!("No {} found, using defaults", DEFAULT_CONFIG);
            return Ok(config::Root::default());
        }
    };

    let root = if path.extension().map_or(false, |ext| ext == "json") {
        config::read_config_json(path)
    } else {
        config::read_config_yaml(path)
    };
    root.with_context(|| format!("loading {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config_root = load_config(cli.config.as_deref())?;

    if let Some(brightness) = cli.brightness {
        config_root.lights.brightness = brightness;
    }
    if let Some(max_distance) = cli.max_distance {
        config_root.lights.max_distance = max_distance;
    }
    if cli.scan {
        config_root.lights.scan_enabled = true;
    }
    if let Some(udp) = cli.udp {
        config_root.listen.udp_addr = Some(udp);
    }
    if cli.no_stdin {
        config_root.listen.stdin = false;
    }
    if let Some(local_address) = cli.local_address {
        config_root.network.local_address = Some(local_address);
    }
    if let Some(port) = cli.port {
        config_root.network.port = port;
    }
    config_root.check()?;
    if config_root.listen.udp_addr.is_none() && !config_root.listen.stdin {
        bail!("no message sources; enable stdin or set a UDP address");
    }

    let pipeline = Pipeline::from_config(&config_root)?;

    // Message channel used as the pipeline's event bus.
    let (sender, receiver) = channel::unbounded();
    if let Some(udp_addr) = &config_root.listen.udp_addr {
        listener::start_udp_thread(udp_addr, sender.clone())?;
    }
    if config_root.listen.stdin {
        listener::start_stdin_thread(sender.clone());
    }
    drop(sender);

    listener::serve(&pipeline, receiver);
    pipeline.shutdown();

    Ok(())
}
