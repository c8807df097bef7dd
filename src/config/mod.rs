use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::{fs, io};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::error;

use crate::color::{self, ColorTriple};
use crate::intensity::NUM_LEDS;

/// UDP port peripherals listen on.
pub const DEFAULT_PORT: u16 = 55555;
/// Default write timeout for the command socket.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 250;
/// TEST-NET-1; routed like any off-subnet host but never contacted.
pub const DEFAULT_ROUTE_TARGET_IP: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Root {
    /// Where commands go and how.
    pub network: Network,
    /// Initial light settings.
    pub lights: Lights,
    /// Peripheral short id -> colour.
    pub peripherals: Peripherals,
    /// Where observations and control messages come from.
    pub listen: Listen,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Network {
    /// Peripheral UDP port.
    pub port: u16,
    /// Write timeout for the command socket, in milliseconds.
    pub send_timeout_ms: u64,
    /// Fixed local address. When unset, the routing table is asked per observation.
    pub local_address: Option<Ipv4Addr>,
    /// Destination used to find the outbound interface address.
    pub route_target: SocketAddr,
}

impl Default for Network {
    fn default() -> Network {
        Network {
            port: DEFAULT_PORT,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            local_address: None,
            route_target: SocketAddr::from((DEFAULT_ROUTE_TARGET_IP, 9)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Lights {
    /// Elements per peripheral strip.
    pub num_leds: u32,
    /// Colour channel magnitude.
    pub brightness: u32,
    /// Distance at which a strip goes dark.
    pub max_distance: f64,
    /// Whether to act on observations at startup.
    pub scan_enabled: bool,
}

impl Default for Lights {
    fn default() -> Lights {
        Lights {
            num_leds: NUM_LEDS,
            brightness: 0,
            max_distance: 5.0,
            scan_enabled: false,
        }
    }
}

/// Peripheral colour table.
///
/// Keys are short ids. YAML reads an unquoted `39:` as a number, so numeric
/// keys are taken as their decimal text; quote ids with leading zeros.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Peripherals(pub HashMap<String, ColorTriple>);

/// A short id as written in a config file.
#[derive(Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
enum ShortIdKey {
    Text(String),
    Number(i64),
}

impl From<ShortIdKey> for String {
    fn from(key: ShortIdKey) -> String {
        match key {
            ShortIdKey::Text(text) => text,
            ShortIdKey::Number(number) => number.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for Peripherals {
    fn deserialize<D>(deserializer: D) -> Result<Peripherals, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = HashMap::<ShortIdKey, ColorTriple>::deserialize(deserializer)?;
        Ok(Peripherals(
            raw.into_iter().map(|(key, color)| (key.into(), color)).collect(),
        ))
    }
}

impl Default for Peripherals {
    fn default() -> Peripherals {
        Peripherals(color::default_colors())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Listen {
    /// UDP address to accept JSON messages on.
    pub udp_addr: Option<String>,
    /// Read JSON lines from standard input.
    pub stdin: bool,
}

impl Default for Listen {
    fn default() -> Listen {
        Listen {
            udp_addr: None,
            stdin: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn read_config_yaml<T: AsRef<Path>>(path: T) -> Result<Root, ConfigError> {
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let root: Root = serde_yaml::from_reader(reader).map_err(|err| {
        error!("Error reading config file: {}", err);
        err
    })?;
    root.check()?;
    Ok(root)
}

pub fn read_config_json<T: AsRef<Path>>(path: T) -> Result<Root, ConfigError> {
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let root: Root = serde_json::from_reader(reader).map_err(|err| {
        error!("Error reading config file: {}", err);
        err
    })?;
    root.check()?;
    Ok(root)
}

impl Root {
    /// Quick sanity check for the configuration.
    pub fn check(&self) -> Result<(), ConfigError> {
        let lights = &self.lights;
        if lights.num_leds == 0 {
            return Err(ConfigError::Invalid("numLeds must be at least 1".into()));
        }
        if !(lights.max_distance.is_finite() && lights.max_distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "maxDistance must be positive, got {}",
                lights.max_distance
            )));
        }
        Ok(())
    }
}
