//! # Motion Module
//!
//! Shared motion vocabulary for the jog engine.
//!
//! This module handles:
//! - Machine axis identifiers and axis→distance maps
//! - The motion-dispatch contract the jog components call into
//! - A channel-backed dispatcher that enqueues commands for a sender

pub mod axis;
pub mod dispatch;

pub use axis::{Axis, AxisMap};
pub use dispatch::{ChannelDispatch, MotionCommand, MotionDispatch};
