//! # Jog Module
//!
//! The input-coordination core: converts held keys, analog stick
//! deflection, and MPG wheel rotation into a rate-limited stream of motion
//! commands.
//!
//! This module handles:
//! - Classifying analog readings as idle against a profile deadzone
//! - Disambiguating key taps from holds (discrete vs continuous jog)
//! - Polling a deflected stick into acknowledgment-gated increments
//! - Converting wheel detents into single-step jogs
//!
//! The components are independent producers into the same
//! [`MotionDispatch`](crate::motion::MotionDispatch) seam; none of them
//! talk to each other, and ordering across input sources is left to the
//! downstream channel.

pub mod idle;
pub mod joystick;
pub mod mpg;
pub mod tap_hold;

pub use idle::is_idle;
pub use joystick::{JoystickLoop, JoystickOptions};
pub use mpg::MpgWheel;
pub use tap_hold::TapHoldJog;
