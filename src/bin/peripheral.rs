use std::net::UdpSocket;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use beaconlight_rs::command;
use beaconlight_rs::config::DEFAULT_PORT;
use beaconlight_rs::intensity::NUM_LEDS;

const MAX_PACKET_SIZE: usize = 512;

/// Stand-in for a peripheral: prints the strip state for every command.
#[derive(Parser, Debug)]
#[command(name = "peripheral", version)]
struct Cli {
    /// Address to receive commands on
    #[arg(long, default_value_t = format!("0.0.0.0:{}", DEFAULT_PORT))]
    bind: String,

    /// Elements on the emulated strip
    #[arg(long, default_value_t = NUM_LEDS)]
    num_leds: u32,
}

fn render(lit: u32, total: u32) -> String {
    (0..total)
        .map(|i| if i < lit { '#' } else { '.' })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let socket = UdpSocket::bind(&cli.bind).with_context(|| format!("binding {}", cli.bind))?;
    info!("[peripheral] Listening on {}", socket.local_addr()?);

    let mut buf = [0; MAX_PACKET_SIZE];
    loop {
        let (len, source) = socket.recv_from(&mut buf)?;
        match command::decode(&buf[..len]) {
            Ok(cmd) => {
                let lit = cmd.led_count.min(cli.num_leds);
                info!(
                    "[peripheral] {} rgb({}, {}, {}) {}",
                    source,
                    cmd.red,
                    cmd.green,
                    cmd.blue,
                    render(lit, cli.num_leds)
                );
            }
            Err(err) => warn!("[peripheral] Bad command from {}: {}", source, err),
        }
    }
}
