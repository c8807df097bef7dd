//! Peripheral colour assignment.

use std::collections::HashMap;
use std::convert::TryFrom;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channel enable flags for a peripheral. Each channel is 0 or 1 and gets
/// multiplied by the brightness when a command is built.
///
/// In configuration files a triple is written as `[red, green, blue]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "[u8; 3]", into = "[u8; 3]")]
pub struct ColorTriple {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("colour channel flags must be 0 or 1, got [{0}, {1}, {2}]")]
    InvalidFlags(u8, u8, u8),
}

impl ColorTriple {
    pub const RED: ColorTriple = ColorTriple { red: 1, green: 0, blue: 0 };
    pub const GREEN: ColorTriple = ColorTriple { red: 0, green: 1, blue: 0 };
    pub const BLUE: ColorTriple = ColorTriple { red: 0, green: 0, blue: 1 };
    /// Fallback for peripherals missing from the table.
    pub const WHITE: ColorTriple = ColorTriple { red: 1, green: 1, blue: 1 };
}

impl TryFrom<[u8; 3]> for ColorTriple {
    type Error = ColorError;

    fn try_from([red, green, blue]: [u8; 3]) -> Result<Self, Self::Error> {
        if red > 1 || green > 1 || blue > 1 {
            return Err(ColorError::InvalidFlags(red, green, blue));
        }
        Ok(ColorTriple { red, green, blue })
    }
}

impl From<ColorTriple> for [u8; 3] {
    fn from(color: ColorTriple) -> [u8; 3] {
        [color.red, color.green, color.blue]
    }
}

/// Map of peripheral short id -> colour.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    colors: HashMap<String, ColorTriple>,
}

impl ColorTable {
    pub fn new(colors: HashMap<String, ColorTriple>) -> ColorTable {
        ColorTable { colors }
    }

    /// Look up a peripheral's colour. Unknown peripherals are white.
    pub fn color_for(&self, short_id: &str) -> ColorTriple {
        self.colors
            .get(short_id)
            .copied()
            .unwrap_or(ColorTriple::WHITE)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// The stock three-peripheral fleet.
pub fn default_colors() -> HashMap<String, ColorTriple> {
    let mut colors = HashMap::new();
    colors.insert("B3".to_owned(), ColorTriple::RED);
    colors.insert("39".to_owned(), ColorTriple::GREEN);
    colors.insert("27".to_owned(), ColorTriple::BLUE);
    colors
}

impl Default for ColorTable {
    fn default() -> ColorTable {
        ColorTable::new(default_colors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_peripherals_get_one_channel() {
        let table = ColorTable::default();
        assert_eq!(table.color_for("B3"), ColorTriple::RED);
        assert_eq!(table.color_for("39"), ColorTriple::GREEN);
        assert_eq!(table.color_for("27"), ColorTriple::BLUE);
    }

    #[test]
    fn unknown_peripheral_falls_back_to_white() {
        let table = ColorTable::default();
        assert_eq!(table.color_for("unknown"), ColorTriple::WHITE);
        assert_eq!(ColorTable::new(HashMap::new()).color_for("B3"), ColorTriple::WHITE);
    }

    #[test]
    fn triples_load_from_arrays() {
        let colors: HashMap<String, ColorTriple> =
            serde_yaml::from_str("A1: [0, 1, 1]\n").unwrap();
        assert_eq!(colors["A1"], ColorTriple { red: 0, green: 1, blue: 1 });
    }

    #[test]
    fn non_flag_channels_are_rejected() {
        assert_eq!(
            ColorTriple::try_from([2, 0, 0]),
            Err(ColorError::InvalidFlags(2, 0, 0))
        );
        assert!(serde_json::from_str::<ColorTriple>("[1, 0, 255]").is_err());
    }
}
