//! Beacon identities.
//!
//! A beacon advertises a name like `"PI-B3-27"`: a free-form prefix, the
//! peripheral's short id and the host part of its network address.

use serde::Deserialize;

/// Separator between the parts of an advertised name.
pub const NAME_DELIMITER: char = '-';

/// A single advertisement as reported by the scanner.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct BeaconObservation {
    /// Advertised device name.
    #[serde(alias = "advertisedName")]
    pub name: String,
    /// Raw signal strength, kept for logging only.
    #[serde(default)]
    pub rssi: f64,
    /// Distance estimated upstream from `rssi`, same unit as the max distance.
    #[serde(alias = "estimatedDistance")]
    pub distance: f64,
}

impl BeaconObservation {
    pub fn new(name: &str, rssi: f64, distance: f64) -> BeaconObservation {
        BeaconObservation {
            name: name.to_owned(),
            rssi,
            distance,
        }
    }
}

/// The peripheral a beacon belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralIdentity {
    /// Key into the colour table.
    pub short_id: String,
    /// Host part of the peripheral's address, unvalidated.
    pub address_fragment: String,
}

/// Split an advertised name into a peripheral identity.
///
/// Only names with exactly three parts are recognized. Anything else is not
/// one of ours and yields `None`. Segment contents are not checked here.
pub fn parse(name: &str) -> Option<PeripheralIdentity> {
    let mut parts = name.split(NAME_DELIMITER);
    let _prefix = parts.next()?;
    let short_id = parts.next()?;
    let address_fragment = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    Some(PeripheralIdentity {
        short_id: short_id.to_owned(),
        address_fragment: address_fragment.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_parts_make_an_identity() {
        let identity = parse("X-B3-27").unwrap();
        assert_eq!(identity.short_id, "B3");
        assert_eq!(identity.address_fragment, "27");
    }

    #[test]
    fn other_part_counts_are_dropped() {
        for name in &["foo", "a-b", "a-b-c-d", "", "-"] {
            assert_eq!(parse(name), None, "{:?} should not parse", name);
        }
    }

    #[test]
    fn empty_segments_pass_through() {
        let identity = parse("--").unwrap();
        assert_eq!(identity.short_id, "");
        assert_eq!(identity.address_fragment, "");
    }

    #[test]
    fn observation_accepts_scanner_field_names() {
        let obs: BeaconObservation = serde_json::from_str(
            r#"{"advertisedName": "PI-39-7", "rssi": -71.5, "estimatedDistance": 2.0}"#,
        )
        .unwrap();
        assert_eq!(obs, BeaconObservation::new("PI-39-7", -71.5, 2.0));
    }
}
