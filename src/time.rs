//! Wall-clock sources and the fixed-timestep tick clock.
//!
//! The host calls `Bakery::advance(now_ms)` from whatever loop it has (a
//! frame callback, `setInterval`, a test). `TickClock` turns those variable
//! deltas into whole ticks, and `IntervalTimer` drives the autosave timers.

use std::cell::Cell;

/// Source of epoch-millisecond timestamps.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Real wall clock.
///
/// `std::time::SystemTime::now()` panics on `wasm32-unknown-unknown`, so the
/// browser build reads `Date.now()` instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.now.set(self.now.get() + secs * 1000.0);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

/// Fixed-timestep accumulator.
pub struct TickClock {
    /// Milliseconds per tick (1000ms = 1 tick/sec)
    ms_per_tick: f64,
    /// Largest delta accepted per update
    max_delta_ms: f64,
    /// Accumulated milliseconds not yet consumed as ticks
    accumulator: f64,
    /// Total elapsed ticks since creation
    pub total_ticks: u64,
    /// Timestamp of the last update (ms), None if first frame
    last_timestamp: Option<f64>,
}

impl TickClock {
    pub fn new(ms_per_tick: f64, max_delta_ms: f64) -> Self {
        Self {
            ms_per_tick,
            max_delta_ms,
            accumulator: 0.0,
            total_ticks: 0,
            last_timestamp: None,
        }
    }

    /// Feed a wall-clock timestamp. Returns the number of whole ticks to run.
    pub fn update(&mut self, now_ms: f64) -> u32 {
        let delta = match self.last_timestamp {
            // Clamp so a suspended tab doesn't replay hours of ticks; long
            // absences are covered by offline progress instead.
            Some(prev) => (now_ms - prev).clamp(0.0, self.max_delta_ms),
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);

        self.accumulator += delta;
        let ticks = (self.accumulator / self.ms_per_tick) as u32;
        self.accumulator -= ticks as f64 * self.ms_per_tick;
        self.total_ticks += ticks as u64;
        ticks
    }
}

/// Recurring timer measured in ticks' worth of seconds.
#[derive(Clone, Debug)]
pub struct IntervalTimer {
    interval_secs: f64,
    elapsed_secs: f64,
}

impl IntervalTimer {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval_secs,
            elapsed_secs: 0.0,
        }
    }

    /// Advance by `secs`; true if the interval elapsed at least once.
    ///
    /// Several missed intervals collapse into a single firing.
    pub fn advance(&mut self, secs: f64) -> bool {
        self.elapsed_secs += secs;
        if self.elapsed_secs >= self.interval_secs {
            self.elapsed_secs %= self.interval_secs;
            true
        } else {
            false
        }
    }

    /// Restart the interval, e.g. after an out-of-band save.
    pub fn reset(&mut self) {
        self.elapsed_secs = 0.0;
    }
}
