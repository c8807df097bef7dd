use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use beaconlight_rs::config::{DEFAULT_PORT, DEFAULT_SEND_TIMEOUT_MS};
use beaconlight_rs::host::{Transport, UdpTransport};
use beaconlight_rs::intensity::NUM_LEDS;
use beaconlight_rs::LightCommand;

/// Send light commands straight to a peripheral.
#[derive(Parser, Debug)]
#[command(name = "lightclient", version)]
struct Cli {
    /// Peripheral address
    ip: Ipv4Addr,

    /// Peripheral UDP port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Elements to light
    #[arg(long, default_value_t = NUM_LEDS)]
    leds: u32,

    #[arg(short, long, default_value_t = 0)]
    red: u32,
    #[arg(short, long, default_value_t = 0)]
    green: u32,
    #[arg(short, long, default_value_t = 0)]
    blue: u32,

    /// Keep sending, sweeping the element count up and down
    #[arg(long)]
    sweep: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let dest = SocketAddr::from((cli.ip, cli.port));
    let mut transport = UdpTransport::bind(Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS))
        .context("Unable to create UDP socket")?;

    if !cli.sweep {
        let cmd = LightCommand::new(cli.leds, cli.red, cli.green, cli.blue);
        transport.send_to(&cmd.encode(), dest)?;
        info!("[lightclient] \"{}\" -> {}", cmd, dest);
        return Ok(());
    }

    info!("[lightclient] Sweeping {} LEDs on {}", cli.leds, dest);
    let started = Instant::now();
    loop {
        let t = started.elapsed().as_secs_f32();
        let level = (t * 2.0).sin() * 0.5 + 0.5;
        let leds = (level * cli.leds as f32) as u32;
        let cmd = LightCommand::new(leds, cli.red, cli.green, cli.blue);
        if let Err(err) = transport.send_to(&cmd.encode(), dest) {
            warn!("[lightclient] Send to {} failed: {}", dest, err);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
