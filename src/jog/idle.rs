//! # Idle Evaluator
//!
//! Pure classifier deciding whether a set of analog readings counts as
//! "no input" under a profile's deadzone. Leaf dependency of the polling
//! loop; has no state and no side effects.

use crate::gamepad::GamepadProfile;

/// Returns true if every reading is idle under the profile's deadzone.
///
/// With no deadzone configured (`zero_threshold <= 0`), only an exact-zero
/// reading is idle. With a deadzone of `d` percent, a reading is idle when
/// it lies strictly inside `(-d/100, +d/100)` — a reading exactly on the
/// boundary is live. An empty reading list is vacuously idle.
///
/// # Examples
///
/// ```
/// use pendant_bridge::gamepad::GamepadProfile;
/// use pendant_bridge::jog::is_idle;
///
/// let profile = GamepadProfile::with_zero_threshold(15.0);
/// assert!(is_idle(&[0.1, -0.1], &profile));
/// assert!(!is_idle(&[0.2], &profile));
///
/// // No deadzone: exact zero only.
/// let strict = GamepadProfile::default();
/// assert!(is_idle(&[0.0, 0.0], &strict));
/// assert!(!is_idle(&[0.001], &strict));
/// ```
#[must_use]
pub fn is_idle(readings: &[f64], profile: &GamepadProfile) -> bool {
    let deadzone = profile.zero_threshold / 100.0;
    if deadzone <= 0.0 {
        return readings.iter().all(|value| *value == 0.0);
    }
    readings
        .iter()
        .all(|value| *value > -deadzone && *value < deadzone)
}
