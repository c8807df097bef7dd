//! Live settings shared between the user controls and the pipeline.
//!
//! Each field is its own atomic. Readers take a [`Snapshot`] per observation
//! and may see one field updated before another; that is fine for lights.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use thiserror::Error;

use crate::config;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("max distance must be a positive number, got {0}")]
    InvalidMaxDistance(f64),
}

/// Values read by the pipeline for one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub brightness: u32,
    pub max_distance: f64,
    pub scan_enabled: bool,
}

#[derive(Debug)]
pub struct Settings {
    brightness: AtomicU32,
    /// `f64` bits.
    max_distance: AtomicU64,
    scan_enabled: AtomicBool,
}

impl Settings {
    pub fn new(brightness: u32, max_distance: f64, scan_enabled: bool) -> Result<Settings, SettingsError> {
        check_max_distance(max_distance)?;
        Ok(Settings {
            brightness: AtomicU32::new(brightness),
            max_distance: AtomicU64::new(max_distance.to_bits()),
            scan_enabled: AtomicBool::new(scan_enabled),
        })
    }

    pub fn from_config(lights: &config::Lights) -> Result<Settings, SettingsError> {
        Settings::new(lights.brightness, lights.max_distance, lights.scan_enabled)
    }

    pub fn brightness(&self) -> u32 {
        self.brightness.load(Ordering::Relaxed)
    }

    pub fn set_brightness(&self, brightness: u32) {
        self.brightness.store(brightness, Ordering::Relaxed);
    }

    pub fn max_distance(&self) -> f64 {
        f64::from_bits(self.max_distance.load(Ordering::Relaxed))
    }

    /// Rejected values leave the current setting in place.
    pub fn set_max_distance(&self, max_distance: f64) -> Result<(), SettingsError> {
        check_max_distance(max_distance)?;
        self.max_distance
            .store(max_distance.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    pub fn scan_enabled(&self) -> bool {
        self.scan_enabled.load(Ordering::Relaxed)
    }

    /// Returns the previous value.
    pub fn set_scan_enabled(&self, enabled: bool) -> bool {
        self.scan_enabled.swap(enabled, Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            brightness: self.brightness(),
            max_distance: self.max_distance(),
            scan_enabled: self.scan_enabled(),
        }
    }
}

impl Default for Settings {
    fn default() -> Settings {
        let lights = config::Lights::default();
        Settings {
            brightness: AtomicU32::new(lights.brightness),
            max_distance: AtomicU64::new(lights.max_distance.to_bits()),
            scan_enabled: AtomicBool::new(lights.scan_enabled),
        }
    }
}

fn check_max_distance(max_distance: f64) -> Result<(), SettingsError> {
    if max_distance.is_finite() && max_distance > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::InvalidMaxDistance(max_distance))
    }
}
