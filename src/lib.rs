//! Beacon proximity to peripheral lighting.
//!
//! Beacons advertise `"<prefix>-<short id>-<address fragment>"`. For every
//! observation the pipeline picks the peripheral's colour, turns the
//! estimated distance into a number of lit elements, composes the
//! peripheral's address on our subnet and sends it a one-line UDP command.

pub mod address;
pub mod color;
pub mod command;
pub mod config;
pub mod host;
pub mod identity;
pub mod intensity;
pub mod listener;
pub mod pipeline;
pub mod settings;

pub use command::LightCommand;
pub use identity::BeaconObservation;
pub use pipeline::{Outcome, Pipeline};
