//! # Analog Polling Loop
//!
//! Samples a continuously-deflected thumbstick into a bounded,
//! acknowledgment-gated stream of incremental jogs.
//!
//! ## Timing
//!
//! | Phase | Duration | Purpose |
//! |-------|----------|---------|
//! | Initial delay | 600 ms | A flick released before this emits one tap jog |
//! | Poll interval | 210 ms | One sample-and-jog cycle per tick |
//! | Execution window | 0.25 s | Caps how far one increment can move |
//! | Cancel debounce | 50 ms | Collapses burst stops into one cancel |
//!
//! ## Flow control
//!
//! Each emission drops the ready flag; the flag is raised again only by
//! [`acknowledge`](JoystickLoop::acknowledge), driven externally from the
//! motion channel's read side. A cycle that finds the flag down skips
//! entirely — nothing is queued, nothing is dropped from the loop — so the
//! loop can never put two increments in flight at once, no matter how slow
//! the serial link is.
//!
//! ## Safety behavior
//!
//! Every cycle re-reads the live gamepad snapshot. The loop stops itself
//! when the stick goes idle or when a configured lockout button is not
//! held; `stop` clears both timers on every path and a stray fired timer
//! after a stop is made inert by a per-run id check.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::gamepad::{GamepadProfile, GamepadSnapshot};
use crate::jog::idle::is_idle;
use crate::motion::{AxisMap, MotionDispatch};
use crate::timing::{Debounce, OneShotTimer, RepeatingTimer};

/// Delay between `start` and the first sample-and-jog cycle.
pub const JOYSTICK_INITIAL_DELAY: Duration = Duration::from_millis(600);

/// Period of the repeating sample-and-jog cycle.
pub const JOYSTICK_POLL_INTERVAL: Duration = Duration::from_millis(210);

/// Assumed execution time of one incremental command, in seconds.
///
/// Bounds the per-cycle travel: even if a cycle is delayed, no single
/// command can move the machine further than a quarter second of motion at
/// the commanded feedrate.
pub const COMMAND_EXECUTION_WINDOW_SECS: f64 = 0.25;

/// Trailing-edge window for the cancel callback.
pub const CANCEL_DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);

/// Per-run parameters, captured at construction or via `set_options`.
#[derive(Debug, Clone)]
pub struct JoystickOptions {
    /// Gamepad profile supplying deadzone and lockout button.
    pub profile: GamepadProfile,
    /// Signed per-axis unit vector; sign carries jog direction.
    pub axes: AxisMap,
    /// Nominal feedrate in distance per minute at full deflection.
    pub feedrate: f64,
}

struct Inner {
    options: JoystickOptions,
    running: bool,
    /// Increments per run; stale timer callbacks carry the old id.
    run_id: u64,
    started_at: Option<Instant>,
    /// Index of the analog axis whose deflection scales the feedrate.
    active_axis: usize,
    /// Flow-control flag: true when the channel may take another command.
    ready: bool,
    delay_timer: Option<OneShotTimer>,
    tick_timer: Option<RepeatingTimer>,
    cancel_debounce: Debounce,
}

struct Core {
    dispatch: Arc<dyn MotionDispatch>,
    snapshot: watch::Receiver<GamepadSnapshot>,
    inner: Mutex<Inner>,
}

impl Core {
    /// First cycle after the initial delay, then the periodic ticks.
    fn on_initial_delay(self: Arc<Self>, run_id: u64) {
        self.run_cycle(run_id);

        let mut inner = self.inner.lock().unwrap();
        if !inner.running || inner.run_id != run_id {
            return;
        }
        let weak = Arc::downgrade(&self);
        inner.tick_timer = Some(RepeatingTimer::every(JOYSTICK_POLL_INTERVAL, move || {
            if let Some(core) = weak.upgrade() {
                core.run_cycle(run_id);
            }
        }));
    }

    /// One sample-and-jog cycle.
    fn run_cycle(&self, run_id: u64) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.running || inner.run_id != run_id {
            return;
        }
        if !inner.ready {
            debug!("motion channel busy, skipping cycle");
            return;
        }

        let snap = self.snapshot.borrow().clone();
        let profile = &inner.options.profile;
        let idle = is_idle(&snap.axes, profile);
        let lockout_released = profile
            .lockout_button
            .map_or(false, |button| !snap.button_pressed(button));

        if idle || lockout_released {
            let final_jog = self.stop_locked(&mut inner);
            drop(inner);
            if let Some((axes, feedrate)) = final_jog {
                self.dispatch.jog(&axes, Some(feedrate));
            }
            return;
        }

        let (axes, feedrate) = Self::compute_increment(&snap, &inner);
        inner.ready = false;
        drop(inner);
        debug!(%axes, feedrate, "joystick increment");
        self.dispatch.jog(&axes, Some(feedrate));
    }

    /// Shared stop path; returns a final tap jog to emit, if any.
    ///
    /// Must be called with the lock held; the caller dispatches the
    /// returned jog after releasing it.
    fn stop_locked(&self, inner: &mut Inner) -> Option<(AxisMap, f64)> {
        if !inner.running {
            return None;
        }
        inner.running = false;
        if let Some(timer) = inner.delay_timer.take() {
            timer.cancel();
        }
        if let Some(timer) = inner.tick_timer.take() {
            timer.cancel();
        }

        let elapsed = inner
            .started_at
            .take()
            .map(|at| at.elapsed())
            .unwrap_or_default();

        if elapsed < JOYSTICK_INITIAL_DELAY {
            // The stick was flicked and released before the loop ever
            // emitted: one synchronous final jog instead of a cancel.
            let snap = self.snapshot.borrow().clone();
            info!("flick release, issuing final jog");
            Some(Self::compute_increment(&snap, inner))
        } else {
            info!("joystick run stopped, cancelling jog");
            let dispatch = Arc::clone(&self.dispatch);
            inner.cancel_debounce.call(move || dispatch.cancel());
            None
        }
    }

    /// Feedrate and scaled increment for the current snapshot.
    ///
    /// Feedrate scales with deflection magnitude only; direction comes
    /// from the signs of the configured unit vector.
    fn compute_increment(snap: &GamepadSnapshot, inner: &Inner) -> (AxisMap, f64) {
        let deflection = snap.axis_value(inner.active_axis);
        let feedrate = (inner.options.feedrate * deflection).abs().round();
        let distance =
            round_to_hundredths(feedrate / 60.0 * COMMAND_EXECUTION_WINDOW_SECS);
        (inner.options.axes.scaled(distance), feedrate)
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Acknowledgment-gated polling loop for one analog stick.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio::sync::watch;
/// use pendant_bridge::gamepad::{GamepadProfile, GamepadSnapshot};
/// use pendant_bridge::jog::{JoystickLoop, JoystickOptions};
/// use pendant_bridge::motion::{Axis, AxisMap, ChannelDispatch};
///
/// # async fn example() {
/// let (dispatch, _rx) = ChannelDispatch::channel();
/// let (_tx, snapshot) = watch::channel(GamepadSnapshot::default());
///
/// let joystick = JoystickLoop::new(
///     Arc::new(dispatch),
///     snapshot,
///     JoystickOptions {
///         profile: GamepadProfile::with_zero_threshold(15.0),
///         axes: AxisMap::single(Axis::X, 1.0),
///         feedrate: 4000.0,
///     },
/// );
///
/// joystick.start(0);
/// // ... stick returns to center ...
/// joystick.stop();
/// # }
/// ```
pub struct JoystickLoop {
    core: Arc<Core>,
}

impl JoystickLoop {
    /// Creates a stopped loop reading snapshots from `snapshot`.
    #[must_use]
    pub fn new(
        dispatch: Arc<dyn MotionDispatch>,
        snapshot: watch::Receiver<GamepadSnapshot>,
        options: JoystickOptions,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                dispatch,
                snapshot,
                inner: Mutex::new(Inner {
                    options,
                    running: false,
                    run_id: 0,
                    started_at: None,
                    active_axis: 0,
                    ready: true,
                    delay_timer: None,
                    tick_timer: None,
                    cancel_debounce: Debounce::new(CANCEL_DEBOUNCE_WINDOW),
                }),
            }),
        }
    }

    /// Replaces the per-run parameters.
    ///
    /// Takes effect from the next cycle; a run already in progress keeps
    /// its active axis.
    pub fn set_options(&self, options: JoystickOptions) {
        self.core.inner.lock().unwrap().options = options;
    }

    /// Begins a run driven by the given analog axis.
    ///
    /// Idempotent: while a run is in progress further starts are ignored,
    /// including starts for a different stick — interleaving incompatible
    /// motion vectors is worse than finishing the current run, so a stick
    /// switch waits until this run goes idle.
    pub fn start(&self, active_axis: usize) {
        let mut inner = self.core.inner.lock().unwrap();
        if inner.running {
            return;
        }
        inner.running = true;
        inner.run_id += 1;
        inner.started_at = Some(Instant::now());
        inner.active_axis = active_axis;
        inner.ready = true;

        let run_id = inner.run_id;
        let weak = Arc::downgrade(&self.core);
        inner.delay_timer = Some(OneShotTimer::after(JOYSTICK_INITIAL_DELAY, move || {
            if let Some(core) = weak.upgrade() {
                core.on_initial_delay(run_id);
            }
        }));
        info!(active_axis, "joystick run started");
    }

    /// Ends the current run.
    ///
    /// Idempotent: a stop with no run in progress does nothing. A stop
    /// inside the initial-delay window emits one synchronous tap jog; a
    /// later stop requests a (debounced) cancel of the in-flight motion.
    pub fn stop(&self) {
        let mut inner = self.core.inner.lock().unwrap();
        let final_jog = self.core.stop_locked(&mut inner);
        drop(inner);
        if let Some((axes, feedrate)) = final_jog {
            self.core.dispatch.jog(&axes, Some(feedrate));
        }
    }

    /// External acknowledgment that the last command was accepted.
    ///
    /// Raises the flow-control flag so the next cycle may emit again.
    pub fn acknowledge(&self) {
        self.core.inner.lock().unwrap().ready = true;
    }

    /// Returns whether a run is currently in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.core.inner.lock().unwrap().running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::dispatch::mocks::RecordingDispatch;
    use crate::motion::{Axis, MotionCommand};
    use tokio::time::sleep;

    struct Rig {
        joystick: JoystickLoop,
        recorder: RecordingDispatch,
        tx: watch::Sender<GamepadSnapshot>,
    }

    fn rig(options: JoystickOptions) -> Rig {
        let recorder = RecordingDispatch::new();
        let (tx, rx) = watch::channel(GamepadSnapshot::default());
        let joystick = JoystickLoop::new(Arc::new(recorder.clone()), rx, options);
        Rig {
            joystick,
            recorder,
            tx,
        }
    }

    fn x_options() -> JoystickOptions {
        JoystickOptions {
            profile: GamepadProfile::with_zero_threshold(10.0),
            axes: AxisMap::single(Axis::X, 1.0),
            feedrate: 4000.0,
        }
    }

    fn deflect(tx: &watch::Sender<GamepadSnapshot>, axes: Vec<f64>) {
        tx.send(GamepadSnapshot::new(axes, vec![])).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_emission_before_initial_delay() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![1.0]);

        rig.joystick.start(0);
        sleep(JOYSTICK_INITIAL_DELAY - Duration::from_millis(1)).await;

        assert_eq!(rig.recorder.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_emission_after_initial_delay() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![1.0]);

        rig.joystick.start(0);
        sleep(JOYSTICK_INITIAL_DELAY + Duration::from_millis(1)).await;

        // feedrate 4000, distance 4000/60*0.25 = 16.67 after rounding
        assert_eq!(
            rig.recorder.commands(),
            vec![MotionCommand::Jog {
                axes: AxisMap::single(Axis::X, 16.67),
                feedrate: Some(4000.0),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_flow_control_caps_unacknowledged_emissions() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![1.0]);

        rig.joystick.start(0);
        // Many poll intervals, never acknowledged: exactly one command.
        sleep(Duration::from_secs(10)).await;

        assert_eq!(rig.recorder.count_jogs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acknowledgment_releases_next_increment() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![1.0]);

        rig.joystick.start(0);
        sleep(JOYSTICK_INITIAL_DELAY + Duration::from_millis(1)).await;
        assert_eq!(rig.recorder.count_jogs(), 1);

        rig.joystick.acknowledge();
        sleep(JOYSTICK_POLL_INTERVAL).await;
        assert_eq!(rig.recorder.count_jogs(), 2);

        // Still only one increment per acknowledgment.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(rig.recorder.count_jogs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedrate_scales_with_deflection_magnitude() {
        let rig = rig(JoystickOptions {
            axes: AxisMap::single(Axis::X, -1.0),
            ..x_options()
        });
        deflect(&rig.tx, vec![-0.5]);

        rig.joystick.start(0);
        sleep(JOYSTICK_INITIAL_DELAY + Duration::from_millis(1)).await;

        // feedrate |4000 * -0.5| = 2000; distance 2000/60*0.25 = 8.33;
        // direction comes from the unit vector, not the stick sign.
        assert_eq!(
            rig.recorder.commands(),
            vec![MotionCommand::Jog {
                axes: AxisMap::single(Axis::X, -8.33),
                feedrate: Some(2000.0),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_detection_stops_run_with_cancel() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![1.0]);

        rig.joystick.start(0);
        sleep(JOYSTICK_INITIAL_DELAY + Duration::from_millis(1)).await;
        rig.joystick.acknowledge();

        // Stick returns to center; next tick stops the run.
        deflect(&rig.tx, vec![0.0]);
        sleep(JOYSTICK_POLL_INTERVAL).await;
        assert!(!rig.joystick.is_running());

        // The cancel is trailing-edge debounced.
        assert_eq!(rig.recorder.count_cancels(), 0);
        sleep(CANCEL_DEBOUNCE_WINDOW + Duration::from_millis(1)).await;
        assert_eq!(rig.recorder.count_cancels(), 1);
        assert_eq!(rig.recorder.count_jogs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flick_emits_single_tap_and_no_cancel() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![1.0]);

        rig.joystick.start(0);
        sleep(Duration::from_millis(100)).await;
        rig.joystick.stop();

        assert_eq!(
            rig.recorder.commands(),
            vec![MotionCommand::Jog {
                axes: AxisMap::single(Axis::X, 16.67),
                feedrate: Some(4000.0),
            }]
        );

        // No cancel ever arrives, even after the debounce window.
        sleep(Duration::from_secs(1)).await;
        assert_eq!(rig.recorder.count_cancels(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_after_delay_cancels_instead_of_jogging() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![1.0]);

        rig.joystick.start(0);
        sleep(JOYSTICK_INITIAL_DELAY + Duration::from_millis(100)).await;
        rig.joystick.stop();

        sleep(CANCEL_DEBOUNCE_WINDOW + Duration::from_millis(1)).await;
        // One increment from the loop itself, then one cancel; no tap.
        assert_eq!(rig.recorder.count_jogs(), 1);
        assert_eq!(rig.recorder.count_cancels(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let rig = rig(x_options());

        rig.joystick.stop();
        rig.joystick.stop();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(rig.recorder.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_survive_stop() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![1.0]);

        rig.joystick.start(0);
        sleep(JOYSTICK_INITIAL_DELAY + Duration::from_millis(1)).await;
        rig.joystick.stop();
        rig.joystick.acknowledge();

        sleep(Duration::from_secs(10)).await;
        assert_eq!(rig.recorder.count_jogs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent_and_keeps_active_stick() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![0.5, 1.0]);

        rig.joystick.start(0);
        // A second stick coming alive mid-run must not retarget the loop.
        rig.joystick.start(1);

        sleep(JOYSTICK_INITIAL_DELAY + Duration::from_millis(1)).await;
        // Feedrate derives from axis 0 (0.5 deflection), not axis 1.
        assert_eq!(
            rig.recorder.commands(),
            vec![MotionCommand::Jog {
                axes: AxisMap::single(Axis::X, 8.33),
                feedrate: Some(2000.0),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lockout_button_released_stops_run() {
        let mut options = x_options();
        options.profile.lockout_button = Some(2);
        let rig = rig(options);

        // Deflected, but the lockout button is not held.
        rig.tx
            .send(GamepadSnapshot::new(vec![1.0], vec![false, false, false]))
            .unwrap();

        rig.joystick.start(0);
        sleep(JOYSTICK_INITIAL_DELAY + Duration::from_millis(1)).await;

        assert!(!rig.joystick.is_running());
        assert_eq!(rig.recorder.count_jogs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lockout_button_held_allows_run() {
        let mut options = x_options();
        options.profile.lockout_button = Some(2);
        let rig = rig(options);

        rig.tx
            .send(GamepadSnapshot::new(vec![1.0], vec![false, false, true]))
            .unwrap();

        rig.joystick.start(0);
        sleep(JOYSTICK_INITIAL_DELAY + Duration::from_millis(1)).await;

        assert!(rig.joystick.is_running());
        assert_eq!(rig.recorder.count_jogs(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_cycles_do_not_stop_run() {
        let rig = rig(x_options());
        deflect(&rig.tx, vec![1.0]);

        rig.joystick.start(0);
        sleep(Duration::from_secs(3)).await;

        // Never acknowledged: the loop idles but stays alive, and a late
        // acknowledgment picks the stream back up.
        assert!(rig.joystick.is_running());
        rig.joystick.acknowledge();
        sleep(JOYSTICK_POLL_INTERVAL).await;
        assert_eq!(rig.recorder.count_jogs(), 2);
    }

    #[test]
    fn test_round_to_hundredths() {
        assert_eq!(round_to_hundredths(16.6666), 16.67);
        assert_eq!(round_to_hundredths(8.3333), 8.33);
        assert_eq!(round_to_hundredths(0.0), 0.0);
        assert_eq!(round_to_hundredths(1.005), 1.0);
    }
}
