//! # Motion Dispatch
//!
//! The contract between the jog components and the downstream motion
//! channel. Components never talk to the sender directly; they invoke the
//! [`MotionDispatch`] trait, which is fire-and-forget by design — there is
//! no return-value error channel, and failures are the downstream
//! collaborator's to surface.
//!
//! [`ChannelDispatch`] is the production implementation: it enqueues
//! [`MotionCommand`]s on an unbounded mpsc channel whose receiver belongs
//! to the sender task. Flow control is not done here — the joystick loop
//! gates its own emissions on acknowledgment instead.

use tokio::sync::mpsc;
use tracing::warn;

use super::axis::AxisMap;

/// A motion command bound for the downstream sender.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCommand {
    /// Discrete relative move, optionally at a specific feedrate.
    Jog {
        axes: AxisMap,
        feedrate: Option<f64>,
    },
    /// Begin open-ended motion along the given signed unit vector.
    StartContinuous { axes: AxisMap, feedrate: f64 },
    /// End the current continuous motion.
    StopContinuous,
    /// Halt any in-flight jog immediately.
    Cancel,
}

/// Injected motion callbacks used by every jog component.
///
/// Implementations must be cheap and non-blocking: the components call
/// these from timer callbacks on the runtime and expect to return before
/// the next scheduled tick.
#[cfg_attr(test, mockall::automock)]
pub trait MotionDispatch: Send + Sync {
    /// Request a discrete relative move.
    fn jog(&self, axes: &AxisMap, feedrate: Option<f64>);

    /// Request the start of continuous motion.
    fn start_continuous(&self, axes: &AxisMap, feedrate: f64);

    /// Request the end of continuous motion.
    fn stop_continuous(&self);

    /// Request an immediate halt of any in-flight jog.
    fn cancel(&self);
}

/// Dispatcher that enqueues commands on a motion channel.
#[derive(Debug, Clone)]
pub struct ChannelDispatch {
    tx: mpsc::UnboundedSender<MotionCommand>,
}

impl ChannelDispatch {
    /// Creates a dispatcher along with the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MotionCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, command: MotionCommand) {
        // A closed channel means the sender task is gone; per the dispatch
        // contract this degrades to inaction rather than an error.
        if self.tx.send(command).is_err() {
            warn!("motion channel closed, dropping command");
        }
    }
}

impl MotionDispatch for ChannelDispatch {
    fn jog(&self, axes: &AxisMap, feedrate: Option<f64>) {
        self.send(MotionCommand::Jog {
            axes: axes.clone(),
            feedrate,
        });
    }

    fn start_continuous(&self, axes: &AxisMap, feedrate: f64) {
        self.send(MotionCommand::StartContinuous {
            axes: axes.clone(),
            feedrate,
        });
    }

    fn stop_continuous(&self) {
        self.send(MotionCommand::StopContinuous);
    }

    fn cancel(&self) {
        self.send(MotionCommand::Cancel);
    }
}
