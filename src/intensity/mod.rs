//! Distance to light intensity mapping.

/// Number of light elements on a stock peripheral strip.
pub const NUM_LEDS: u32 = 64;

/// How many of `total_elements` to light for a beacon `distance` away.
///
/// The strip is full at distance 0 and empty at `max_distance`, linear in
/// between and truncated toward zero. The result is always in
/// `0..=total_elements`; beacons beyond `max_distance` light nothing.
pub fn intensity(distance: f64, max_distance: f64, total_elements: u32) -> u32 {
    if !(max_distance.is_finite() && max_distance > 0.0) || distance.is_nan() {
        return 0;
    }

    let raw = ((max_distance - distance) / max_distance * f64::from(total_elements)).trunc();
    if raw <= 0.0 {
        0
    } else if raw >= f64::from(total_elements) {
        total_elements
    } else {
        raw as u32
    }
}
