//! # Timing Module
//!
//! Timer and rate-limit primitives shared by the jog components.
//!
//! This module handles:
//! - Cancellable one-shot delays and periodic ticks with owned handles
//! - Leading-edge throttling of repeated callback invocations
//! - Trailing-edge debouncing of burst events
//!
//! Everything is built on `tokio::time`, so tests drive the state machines
//! with the paused-clock runtime instead of wall-clock waits.

pub mod throttle;
pub mod timer;

pub use throttle::{Debounce, Throttle};
pub use timer::{OneShotTimer, RepeatingTimer};
