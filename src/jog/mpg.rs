//! # MPG Wheel Detector
//!
//! Converts a manual-pulse-generator wheel's reported angle into discrete
//! single-step jogs, one per recognized detent.
//!
//! The wheel reports its position as an angle in a wrapping circular
//! domain. Rather than integrating the raw angle, the detector compares
//! each report against the last accepted baseline and only acts when the
//! delta lands inside a detent-sized window: a full sector (60°) plus or
//! minus half a sector of tolerance. Partial or ambiguous rotation — noise,
//! a wrap glitch, a half-turned detent — leaves the baseline untouched so
//! that the motion, if real, completes against the same reference.

use std::sync::Arc;

use tracing::debug;

use crate::motion::{Axis, AxisMap, MotionDispatch};

/// Degrees of wheel rotation per recognized detent.
pub const MPG_SECTOR_DEGREES: f64 = 60.0;

/// Detent window half-width in degrees.
///
/// Both window edges are exclusive: a delta of exactly
/// `MPG_SECTOR_DEGREES - MPG_TOLERANCE_DEGREES` (or the far edge) is
/// treated as ambiguous and produces no step.
pub const MPG_TOLERANCE_DEGREES: f64 = 30.0;

/// Sector-based angle-delta classifier for an MPG wheel.
///
/// Holds only the last accepted angle as state; every other parameter is
/// supplied per update so the UI can retarget axis, step size, and feedrate
/// between detents.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use pendant_bridge::jog::MpgWheel;
/// use pendant_bridge::motion::{Axis, AxisMap, MotionCommand, MotionDispatch};
/// # use std::sync::Mutex;
/// # #[derive(Default)]
/// # struct Null(Mutex<Vec<MotionCommand>>);
/// # impl MotionDispatch for Null {
/// #     fn jog(&self, axes: &AxisMap, feedrate: Option<f64>) {
/// #         self.0.lock().unwrap().push(MotionCommand::Jog { axes: axes.clone(), feedrate });
/// #     }
/// #     fn start_continuous(&self, _: &AxisMap, _: f64) {}
/// #     fn stop_continuous(&self) {}
/// #     fn cancel(&self) {}
/// # }
///
/// let mut wheel = MpgWheel::new(Arc::new(Null::default()));
/// wheel.update(10.0, Axis::X, 0.01, 500.0, 1.0); // baseline only
/// wheel.update(70.0, Axis::X, 0.01, 500.0, 1.0); // one detent
/// ```
pub struct MpgWheel {
    dispatch: Arc<dyn MotionDispatch>,
    last_angle: Option<f64>,
}

impl MpgWheel {
    /// Creates a detector with no baseline.
    #[must_use]
    pub fn new(dispatch: Arc<dyn MotionDispatch>) -> Self {
        Self {
            dispatch,
            last_angle: None,
        }
    }

    /// Feeds one angle report and emits at most one step jog.
    ///
    /// The first report after construction or [`clear`](Self::clear) only
    /// establishes the baseline. After that, a delta inside the positive
    /// detent window emits `+step × direction_factor` on `axis`, a delta
    /// inside the negative window emits the opposite, and anything else is
    /// ignored with the baseline unchanged.
    pub fn update(
        &mut self,
        angle: f64,
        axis: Axis,
        step: f64,
        feedrate: f64,
        direction_factor: f64,
    ) {
        let Some(last) = self.last_angle else {
            self.last_angle = Some(angle);
            return;
        };

        let delta = last - angle;
        let near = MPG_SECTOR_DEGREES - MPG_TOLERANCE_DEGREES;
        let far = MPG_SECTOR_DEGREES + MPG_TOLERANCE_DEGREES;

        let distance = if delta > near && delta < far {
            step * direction_factor
        } else if delta > -far && delta < -near {
            -step * direction_factor
        } else {
            // Ambiguous or sub-detent motion: keep the old baseline so a
            // slow detent can still complete against it.
            return;
        };

        debug!(delta, distance, %axis, "mpg detent");
        self.last_angle = Some(angle);
        self.dispatch
            .jog(&AxisMap::single(axis, distance), Some(feedrate));
    }

    /// Drops the stored baseline.
    ///
    /// Called when wheel activity ceases, so the next report starts a fresh
    /// reference instead of comparing against a stale angle.
    pub fn clear(&mut self) {
        self.last_angle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::dispatch::mocks::RecordingDispatch;
    use crate::motion::dispatch::MockMotionDispatch;
    use crate::motion::MotionCommand;

    fn wheel() -> (MpgWheel, RecordingDispatch) {
        let recorder = RecordingDispatch::new();
        let wheel = MpgWheel::new(Arc::new(recorder.clone()));
        (wheel, recorder)
    }

    #[test]
    fn test_first_sample_establishes_baseline_only() {
        let (mut wheel, recorder) = wheel();
        wheel.update(10.0, Axis::X, 1.0, 500.0, 1.0);
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_full_detent_emits_one_negative_step() {
        let (mut wheel, recorder) = wheel();
        wheel.update(10.0, Axis::X, 1.0, 500.0, 1.0);
        wheel.update(70.0, Axis::X, 1.0, 500.0, 1.0); // delta = -60

        let commands = recorder.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0],
            MotionCommand::Jog {
                axes: AxisMap::single(Axis::X, -1.0),
                feedrate: Some(500.0),
            }
        );
    }

    #[test]
    fn test_full_detent_emits_one_positive_step() {
        let (mut wheel, recorder) = wheel();
        wheel.update(70.0, Axis::Y, 0.01, 250.0, 1.0);
        wheel.update(10.0, Axis::Y, 0.01, 250.0, 1.0); // delta = 60

        let commands = recorder.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0],
            MotionCommand::Jog {
                axes: AxisMap::single(Axis::Y, 0.01),
                feedrate: Some(250.0),
            }
        );
    }

    #[test]
    fn test_half_sector_boundary_is_ambiguous() {
        // delta = -30 sits exactly on the (exclusive) near edge.
        let (mut wheel, recorder) = wheel();
        wheel.update(10.0, Axis::X, 1.0, 500.0, 1.0);
        wheel.update(40.0, Axis::X, 1.0, 500.0, 1.0);
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_far_boundary_is_ambiguous() {
        // delta = 90 sits exactly on the (exclusive) far edge.
        let (mut wheel, recorder) = wheel();
        wheel.update(100.0, Axis::X, 1.0, 500.0, 1.0);
        wheel.update(10.0, Axis::X, 1.0, 500.0, 1.0);
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_ambiguous_motion_keeps_baseline() {
        let (mut wheel, recorder) = wheel();
        wheel.update(10.0, Axis::X, 1.0, 500.0, 1.0);
        wheel.update(30.0, Axis::X, 1.0, 500.0, 1.0); // delta = -20, ignored
        wheel.update(70.0, Axis::X, 1.0, 500.0, 1.0); // delta vs 10 = -60

        assert_eq!(recorder.count_jogs(), 1);
    }

    #[test]
    fn test_accepted_detent_moves_baseline() {
        let (mut wheel, recorder) = wheel();
        wheel.update(10.0, Axis::X, 1.0, 500.0, 1.0);
        wheel.update(70.0, Axis::X, 1.0, 500.0, 1.0);
        wheel.update(130.0, Axis::X, 1.0, 500.0, 1.0);

        assert_eq!(recorder.count_jogs(), 2);
    }

    #[test]
    fn test_direction_factor_reverses_step() {
        let (mut wheel, recorder) = wheel();
        wheel.update(10.0, Axis::Z, 0.1, 500.0, -1.0);
        wheel.update(70.0, Axis::Z, 0.1, 500.0, -1.0); // delta = -60

        let commands = recorder.commands();
        assert_eq!(
            commands[0],
            MotionCommand::Jog {
                axes: AxisMap::single(Axis::Z, 0.1),
                feedrate: Some(500.0),
            }
        );
    }

    #[test]
    fn test_clear_resets_baseline() {
        let (mut wheel, recorder) = wheel();
        wheel.update(10.0, Axis::X, 1.0, 500.0, 1.0);
        wheel.clear();
        wheel.update(70.0, Axis::X, 1.0, 500.0, 1.0); // baseline again

        assert_eq!(recorder.count(), 0);

        wheel.update(130.0, Axis::X, 1.0, 500.0, 1.0); // now a detent
        assert_eq!(recorder.count_jogs(), 1);
    }

    #[test]
    fn test_detent_against_mock_expectations() {
        let mut mock = MockMotionDispatch::new();
        mock.expect_jog()
            .withf(|axes, feedrate| {
                axes.get(Axis::A) == Some(0.5) && *feedrate == Some(100.0)
            })
            .times(1)
            .return_const(());

        let mut wheel = MpgWheel::new(Arc::new(mock));
        wheel.update(200.0, Axis::A, 0.5, 100.0, 1.0);
        wheel.update(140.0, Axis::A, 0.5, 100.0, 1.0); // delta = 60
    }
}
