//! Peripheral light command wire format.
//!
//! A command is one ASCII line of four space-separated decimal integers:
//! `"<led count> <red> <green> <blue>"`. There is no header, length or
//! terminator; one datagram carries one command.

use std::fmt;
use std::str;

use thiserror::Error;

use crate::color::ColorTriple;

/// Number of fields in a command line.
const FIELD_COUNT: usize = 4;
const FIELD_NAMES: [&str; FIELD_COUNT] = ["led count", "red", "green", "blue"];

/// Lighting state for a single peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightCommand {
    /// Number of elements to light, counted from the start of the strip.
    pub led_count: u32,
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl LightCommand {
    pub fn new(led_count: u32, red: u32, green: u32, blue: u32) -> LightCommand {
        LightCommand {
            led_count,
            red,
            green,
            blue,
        }
    }

    /// Build a command from pipeline values.
    ///
    /// `led_count` is clamped to `num_leds`; each colour flag is scaled by
    /// `brightness`.
    pub fn from_parts(
        led_count: u32,
        color: ColorTriple,
        brightness: u32,
        num_leds: u32,
    ) -> LightCommand {
        let scale = |flag: u8| u32::from(flag).saturating_mul(brightness);
        LightCommand {
            led_count: led_count.min(num_leds),
            red: scale(color.red),
            green: scale(color.green),
            blue: scale(color.blue),
        }
    }

    /// Serialize into a datagram payload.
    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for LightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.led_count, self.red, self.green, self.blue)
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("command is not valid UTF-8")]
    NotUtf8,
    #[error("expected four fields, found {found}")]
    FieldCount { found: usize },
    #[error("invalid {field} value {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Parse a command as a peripheral receives it.
///
/// Surrounding whitespace (a trailing newline from a hand-typed `nc`
/// session, say) is ignored.
pub fn decode(buf: &[u8]) -> DecodeResult<LightCommand> {
    let text = str::from_utf8(buf).map_err(|_| DecodeError::NotUtf8)?;
    let fields: Vec<&str> = text.split_ascii_whitespace().collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount {
            found: fields.len(),
        });
    }

    let mut values = [0u32; FIELD_COUNT];
    for (i, field) in fields.iter().enumerate() {
        values[i] = field.parse().map_err(|_| DecodeError::InvalidNumber {
            field: FIELD_NAMES[i],
            value: (*field).to_owned(),
        })?;
    }

    Ok(LightCommand::new(values[0], values[1], values[2], values[3]))
}
