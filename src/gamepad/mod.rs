//! # Gamepad Module
//!
//! Read-only view of the pendant gamepad, as supplied by the input adapter.
//!
//! The engine never opens devices itself; an external adapter publishes a
//! [`GamepadSnapshot`] on a `tokio::sync::watch` channel and the polling
//! loop borrows a fresh copy each tick. Nothing in this crate writes to the
//! snapshot, and nothing caches it across ticks — acting on stale
//! deflection is how a machine keeps jogging after the operator lets go.
//!
//! ## Value Ranges
//!
//! | Field | Range | Description |
//! |-------|-------|-------------|
//! | `axes[i]` | -1.0..=1.0 | Normalized stick deflection, 0.0 = centered |
//! | `buttons[i]` | bool | Pressed state |
//!
//! Out-of-range index reads degrade to centered/released rather than
//! panicking; a missing axis is indistinguishable from an idle one.

use serde::Deserialize;

/// A point-in-time view of every analog axis and button.
///
/// # Examples
///
/// ```
/// use pendant_bridge::gamepad::GamepadSnapshot;
///
/// let snapshot = GamepadSnapshot::new(vec![0.8, 0.0], vec![true]);
/// assert_eq!(snapshot.axis_value(0), 0.8);
/// assert_eq!(snapshot.axis_value(9), 0.0); // missing axis reads centered
/// assert!(snapshot.button_pressed(0));
/// assert!(!snapshot.button_pressed(9));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadSnapshot {
    /// Normalized analog axis values, -1.0..=1.0.
    pub axes: Vec<f64>,
    /// Button pressed states.
    pub buttons: Vec<bool>,
}

impl GamepadSnapshot {
    /// Creates a snapshot from raw adapter values.
    #[must_use]
    pub fn new(axes: Vec<f64>, buttons: Vec<bool>) -> Self {
        Self { axes, buttons }
    }

    /// Returns the value of one analog axis, or 0.0 if out of range.
    #[must_use]
    pub fn axis_value(&self, index: usize) -> f64 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    /// Returns whether one button is pressed, or false if out of range.
    #[must_use]
    pub fn button_pressed(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}

/// Per-gamepad jog profile.
///
/// `zero_threshold` is a deadzone expressed in percent of full deflection
/// (0–100). A threshold of 0 disables the deadzone entirely, in which case
/// only an exact-zero reading counts as idle. `lockout_button`, when set,
/// names a button that must be held for the polling loop to keep jogging —
/// a dead-man switch against an accidentally bumped stick.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GamepadProfile {
    /// Deadzone in percent of full deflection (0 disables).
    #[serde(default)]
    pub zero_threshold: f64,
    /// Button index that must be held while jogging, if any.
    #[serde(default)]
    pub lockout_button: Option<usize>,
}

impl GamepadProfile {
    /// Creates a profile with the given deadzone percent and no lockout.
    #[must_use]
    pub fn with_zero_threshold(zero_threshold: f64) -> Self {
        Self {
            zero_threshold,
            lockout_button: None,
        }
    }

    /// Returns the deadzone as a fraction of full deflection, never
    /// negative.
    #[must_use]
    pub fn deadzone_fraction(&self) -> f64 {
        (self.zero_threshold / 100.0).max(0.0)
    }
}
