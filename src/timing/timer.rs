//! # Timer Primitives
//!
//! Cancellable one-shot and repeating timers backed by spawned tokio tasks.
//!
//! Each timer returns an owned handle; dropping the handle (or calling
//! `cancel`) aborts the underlying task, so a component that clears its
//! timer fields on every exit path cannot leave a timer running. Because
//! abort is asynchronous with respect to a callback that is already past
//! its await point, callers must still guard their callbacks with state
//! flags — a fired callback observing a stopped component must do nothing.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A cancellable single-shot delay.
///
/// The callback runs once, `delay` after creation, unless the timer is
/// cancelled or dropped first.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use pendant_bridge::timing::OneShotTimer;
///
/// # async fn example() {
/// let timer = OneShotTimer::after(Duration::from_millis(600), || {
///     println!("fired");
/// });
/// timer.cancel(); // never fires
/// # }
/// ```
#[derive(Debug)]
pub struct OneShotTimer {
    handle: JoinHandle<()>,
}

impl OneShotTimer {
    /// Arms a one-shot timer that runs `callback` after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn after<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        Self { handle }
    }

    /// Cancels the timer. A callback that has not started will never run.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A cancellable periodic tick.
///
/// The callback runs every `period`, starting one full period after
/// creation. Missed ticks are skipped rather than replayed, so a delayed
/// callback never produces a burst of catch-up invocations.
#[derive(Debug)]
pub struct RepeatingTimer {
    handle: JoinHandle<()>,
}

impl RepeatingTimer {
    /// Starts a repeating timer that runs `callback` every `period`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn every<F>(period: Duration, mut callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval yields immediately on the first tick; consume it so
            // the first callback lands one full period from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                callback();
            }
        });
        Self { handle }
    }

    /// Cancels the timer; no further ticks fire.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
