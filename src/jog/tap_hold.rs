//! # Tap/Hold Disambiguator
//!
//! Per-input press/release state machine deciding between a single
//! discrete jog (tap) and continuous motion (hold).
//!
//! One [`TapHoldJog`] serves one logical input — typically one keyboard
//! shortcut. A press arms a one-shot timer; if the input is released before
//! the timer fires the press was a tap and a single discrete jog goes out,
//! otherwise continuous motion starts on fire and stops on release. At most
//! one session exists at a time: key-repeat presses while a session is
//! pending or continuous are ignored, which is what keeps auto-repeat from
//! arming duplicate timers.
//!
//! ## States
//!
//! | State | Meaning |
//! |-------|---------|
//! | `IDLE` | No session; presses accepted |
//! | `PENDING` | Timer armed, release decides tap vs hold |
//! | `CONTINUOUS` | Timer fired, machine is in continuous motion |
//!
//! All emissions are rate limited: taps and continuous starts on a 150 ms
//! leading-edge throttle, continuous stops on a 575 ms one, so a burst of
//! duplicate events cannot flood the motion channel with identical
//! commands.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::motion::{AxisMap, MotionDispatch};
use crate::timing::{OneShotTimer, Throttle};

/// How long a press must be held before it becomes continuous motion.
pub const TAP_HOLD_TIMEOUT: Duration = Duration::from_millis(600);

/// Throttle window for taps and continuous starts.
pub const JOG_THROTTLE_WINDOW: Duration = Duration::from_millis(150);

/// Throttle window for continuous stops: `TAP_HOLD_TIMEOUT` minus 25 ms,
/// so a stop is always admitted for the release ending a fresh hold.
pub const STOP_THROTTLE_WINDOW: Duration = Duration::from_millis(575);

struct Session {
    id: u64,
    pressed_at: Instant,
    /// Distinguishes "resolved as tap" from "never resolved".
    did_press: bool,
    axes: AxisMap,
    feedrate: f64,
    /// Owned exclusively by the session; dropping the session cancels it.
    _timer: OneShotTimer,
}

struct Inner {
    session: Option<Session>,
    continuous: bool,
    next_session: u64,
    jog_throttle: Throttle,
    start_throttle: Throttle,
    stop_throttle: Throttle,
}

struct Core {
    dispatch: Arc<dyn MotionDispatch>,
    inner: Mutex<Inner>,
}

impl Core {
    /// Timer-fire path: `PENDING → CONTINUOUS`.
    fn on_timeout(&self, session_id: u64) {
        let mut inner = self.inner.lock().unwrap();
        // A stale fire (session already resolved, or replaced by a newer
        // press) must have no observable effect.
        let Some(session) = inner.session.as_ref() else {
            return;
        };
        if session.id != session_id {
            return;
        }

        let axes = session.axes.clone();
        let feedrate = session.feedrate;
        inner.continuous = true;
        if inner.start_throttle.admit() {
            drop(inner);
            debug!(%axes, feedrate, "hold threshold reached, starting continuous jog");
            self.dispatch.start_continuous(&axes, feedrate);
        }
    }
}

/// Tap/hold state machine for one logical jog input.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use pendant_bridge::jog::TapHoldJog;
/// use pendant_bridge::motion::{Axis, AxisMap, ChannelDispatch};
///
/// # async fn example() {
/// let (dispatch, _rx) = ChannelDispatch::channel();
/// let jogger = TapHoldJog::new(Arc::new(dispatch));
///
/// // Key down, key up shortly after: one discrete jog.
/// jogger.on_press(AxisMap::single(Axis::X, 1.0), 1500.0);
/// jogger.on_release();
/// # }
/// ```
pub struct TapHoldJog {
    core: Arc<Core>,
}

impl TapHoldJog {
    /// Creates a disambiguator emitting into `dispatch`.
    #[must_use]
    pub fn new(dispatch: Arc<dyn MotionDispatch>) -> Self {
        Self {
            core: Arc::new(Core {
                dispatch,
                inner: Mutex::new(Inner {
                    session: None,
                    continuous: false,
                    next_session: 0,
                    jog_throttle: Throttle::new(JOG_THROTTLE_WINDOW),
                    start_throttle: Throttle::new(JOG_THROTTLE_WINDOW),
                    stop_throttle: Throttle::new(STOP_THROTTLE_WINDOW),
                }),
            }),
        }
    }

    /// Handles the input going down.
    ///
    /// Ignored while a session is already pending or continuous (key-repeat
    /// guard). Otherwise records the press and arms the tap/hold timer.
    /// `axes` is the signed distance map a tap would request; for a hold it
    /// doubles as the continuous direction vector.
    pub fn on_press(&self, axes: AxisMap, feedrate: f64) {
        let mut inner = self.core.inner.lock().unwrap();
        if inner.session.is_some() {
            debug!("press ignored, session already active");
            return;
        }

        let id = inner.next_session;
        inner.next_session += 1;

        let weak = Arc::downgrade(&self.core);
        let timer = OneShotTimer::after(TAP_HOLD_TIMEOUT, move || {
            if let Some(core) = weak.upgrade() {
                core.on_timeout(id);
            }
        });

        inner.session = Some(Session {
            id,
            pressed_at: Instant::now(),
            did_press: true,
            axes,
            feedrate,
            _timer: timer,
        });
    }

    /// Handles the input going up.
    ///
    /// No-op without a session. A release inside the tap window issues the
    /// discrete jog with the coordinates captured at press time; any other
    /// release stops continuous motion. Either way the session is destroyed
    /// and its timer cancelled.
    pub fn on_release(&self) {
        let mut inner = self.core.inner.lock().unwrap();
        let Some(session) = inner.session.take() else {
            return;
        };
        let was_continuous = inner.continuous;
        inner.continuous = false;

        if !was_continuous
            && session.pressed_at.elapsed() < TAP_HOLD_TIMEOUT
            && session.did_press
        {
            if inner.jog_throttle.admit() {
                drop(inner);
                debug!(axes = %session.axes, "tap jog");
                self.core.dispatch.jog(&session.axes, Some(session.feedrate));
            }
        } else if inner.stop_throttle.admit() {
            drop(inner);
            debug!("stopping continuous jog");
            self.core.dispatch.stop_continuous();
        }
    }
}
