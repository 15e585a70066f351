//! # Throttle and Debounce
//!
//! Rate limiting as explicit, auditable state objects rather than library
//! decorators. Two distinct policies exist in the jog engine and they are
//! deliberately separate types:
//!
//! - [`Throttle`] — leading edge only: the first call in a window goes
//!   through immediately, later calls in the same window are dropped with
//!   no trailing replay. Used for discrete jogs and continuous start/stop,
//!   where a replayed command would move the machine again.
//! - [`Debounce`] — trailing edge only: the first call arms a timer for the
//!   end of the window and later calls are absorbed, so a burst collapses
//!   into exactly one invocation. Used for jog cancellation, where only the
//!   final "halt" matters.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use super::timer::OneShotTimer;

/// Leading-edge-only rate limiter.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pendant_bridge::timing::Throttle;
///
/// let mut throttle = Throttle::new(Duration::from_millis(150));
/// assert!(throttle.admit());
/// assert!(!throttle.admit()); // still inside the window
/// ```
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    last_admitted: Option<Instant>,
}

impl Throttle {
    /// Creates a throttle with the given window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_admitted: None,
        }
    }

    /// Returns true if the caller may invoke its callback now.
    ///
    /// Admitting starts (or restarts) the window; denied calls leave the
    /// window untouched and are never replayed.
    pub fn admit(&mut self) -> bool {
        let now = Instant::now();
        match self.last_admitted {
            Some(last) if now.duration_since(last) < self.window => false,
            _ => {
                self.last_admitted = Some(now);
                true
            }
        }
    }
}

/// Trailing-edge-only rate limiter for zero-argument callbacks.
///
/// The first `call` in a window schedules the callback for the end of the
/// window; calls arriving while one is pending are absorbed. Dropping the
/// debounce cancels a pending callback.
#[derive(Debug)]
pub struct Debounce {
    window: Duration,
    pending: Arc<Mutex<bool>>,
    timer: Option<OneShotTimer>,
}

impl Debounce {
    /// Creates a debounce with the given window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Arc::new(Mutex::new(false)),
            timer: None,
        }
    }

    /// Schedules `callback` for the end of the window unless one is
    /// already pending.
    ///
    /// Must be called from within a tokio runtime.
    pub fn call<F>(&mut self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut pending = self.pending.lock().unwrap();
            if *pending {
                return;
            }
            *pending = true;
        }
        // Any timer still held here has already fired; release it.
        if let Some(stale) = self.timer.take() {
            stale.cancel();
        }
        let pending = Arc::clone(&self.pending);
        self.timer = Some(OneShotTimer::after(self.window, move || {
            *pending.lock().unwrap() = false;
            callback();
        }));
    }
}
