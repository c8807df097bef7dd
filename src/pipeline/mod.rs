//! The Pipeline turns beacon observations into peripheral light commands.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::address::{self, LocalAddress, ResolveError, RouteLookup, StaticAddress};
use crate::color::ColorTable;
use crate::command::LightCommand;
use crate::config::Root;
use crate::host::{Delivery, Dispatcher};
use crate::identity::{self, BeaconObservation};
use crate::intensity;
use crate::settings::{Settings, SettingsError};

/// What became of a single observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Scanning is switched off.
    ScanDisabled,
    /// Not one of our beacons.
    Unrecognized,
    /// We don't know our own address, so can't compose the peripheral's.
    NoLocalAddress,
    /// The beacon's address fragment is unusable.
    BadFragment(ResolveError),
    Sent {
        destination: Ipv4Addr,
        command: LightCommand,
    },
    SendFailed {
        destination: Ipv4Addr,
        command: LightCommand,
    },
    /// No session socket.
    NotSent {
        destination: Ipv4Addr,
        command: LightCommand,
    },
}

/// Pipelines read observations and issue commands to peripherals.
pub struct Pipeline {
    /// Peripheral colours.
    colors: ColorTable,
    /// Live user settings.
    settings: Arc<Settings>,
    /// Our own address.
    local: Box<dyn LocalAddress>,
    /// Command delivery.
    dispatcher: Dispatcher,
    /// Elements per peripheral strip.
    num_leds: u32,
    /// Held while the scan flag and the session change together.
    toggle: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        colors: ColorTable,
        settings: Arc<Settings>,
        local: Box<dyn LocalAddress>,
        dispatcher: Dispatcher,
        num_leds: u32,
    ) -> Pipeline {
        let pipeline = Pipeline {
            colors,
            settings,
            local,
            dispatcher,
            num_leds,
            toggle: Mutex::new(()),
        };
        if pipeline.settings.scan_enabled() {
            // Failure is logged by the dispatcher; observations then go nowhere.
            pipeline.dispatcher.open().ok();
        }
        pipeline
    }

    /// Set up a pipeline from a configuration.
    pub fn from_config(config: &Root) -> Result<Pipeline, SettingsError> {
        let settings = Arc::new(Settings::from_config(&config.lights)?);

        let local: Box<dyn LocalAddress> = match config.network.local_address {
            Some(addr) => Box::new(StaticAddress(Some(addr))),
            None => Box::new(RouteLookup::new(config.network.route_target)),
        };

        let dispatcher = Dispatcher::new(
            config.network.port,
            Duration::from_millis(config.network.send_timeout_ms),
        );

        let colors = ColorTable::new(config.peripherals.0.clone());
        if colors.is_empty() {
            warn!("[pipeline] No peripherals configured, every beacon will be white");
        }
        info!(
            "[pipeline] {} peripherals, {} LEDs each",
            colors.len(),
            config.lights.num_leds
        );

        Ok(Pipeline::new(
            colors,
            settings,
            local,
            dispatcher,
            config.lights.num_leds,
        ))
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn set_brightness(&self, brightness: u32) {
        info!("[pipeline] Brightness {}", brightness);
        self.settings.set_brightness(brightness);
    }

    pub fn set_max_distance(&self, max_distance: f64) -> Result<(), SettingsError> {
        self.settings.set_max_distance(max_distance)?;
        info!("[pipeline] Max distance {:.1}", max_distance);
        Ok(())
    }

    /// Toggle scanning. The session socket lives exactly as long as scanning
    /// is on; turning scanning on again retries a socket that failed to open.
    pub fn set_scan_enabled(&self, enabled: bool) {
        let _toggle = self.lock_toggle();
        let was_enabled = self.settings.set_scan_enabled(enabled);
        if enabled != was_enabled {
            info!("[pipeline] Scanning {}", if enabled { "on" } else { "off" });
        }
        if enabled {
            // Failure is logged by the dispatcher.
            self.dispatcher.open().ok();
        } else {
            self.dispatcher.close();
        }
    }

    /// Stop scanning and release the socket.
    pub fn shutdown(&self) {
        let _toggle = self.lock_toggle();
        self.settings.set_scan_enabled(false);
        self.dispatcher.close();
    }

    fn lock_toggle(&self) -> std::sync::MutexGuard<'_, ()> {
        self.toggle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle one observation from the scanner.
    pub fn take_observation(&self, obs: &BeaconObservation) -> Outcome {
        let settings = self.settings.snapshot();
        if !settings.scan_enabled {
            return Outcome::ScanDisabled;
        }

        let identity = match identity::parse(&obs.name) {
            Some(identity) => identity,
            None => {
                debug!("[pipeline] Ignoring beacon {:?}", obs.name);
                return Outcome::Unrecognized;
            }
        };

        let color = self.colors.color_for(&identity.short_id);
        let led_count = intensity::intensity(obs.distance, settings.max_distance, self.num_leds);
        let command = LightCommand::from_parts(led_count, color, settings.brightness, self.num_leds);

        let destination = match address::resolve(&identity.address_fragment, self.local.local_ipv4()) {
            Ok(destination) => destination,
            Err(ResolveError::LocalUnavailable) => {
                warn!("[pipeline] No local address, dropping {:?}", obs.name);
                return Outcome::NoLocalAddress;
            }
            Err(err) => {
                warn!("[pipeline] Beacon {:?}: {}", obs.name, err);
                return Outcome::BadFragment(err);
            }
        };

        debug!(
            "[pipeline] {} rssi {:.0} at {:.2} -> {} \"{}\"",
            identity.short_id, obs.rssi, obs.distance, destination, command
        );

        match self.dispatcher.send(destination, &command.encode()) {
            Delivery::Sent(_) => Outcome::Sent {
                destination,
                command,
            },
            Delivery::Failed => Outcome::SendFailed {
                destination,
                command,
            },
            Delivery::NoTransport => Outcome::NotSent {
                destination,
                command,
            },
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.dispatcher.close();
    }
}
