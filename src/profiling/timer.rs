//! Monotonic clock sampling and timer granularity calibration.
//!
//! All timing uses `std::time::Instant` (CLOCK_MONOTONIC on Linux), which is
//! unaffected by wall-clock adjustments.

use std::time::Instant;

/// Trials used when calibrating the clock granularity.
pub const CALIBRATION_TRIALS: usize = 20;

/// A timed interval shorter than this many granularity units is unreliable.
pub const MIN_TICKS_PER_TEST: u64 = 20;

/// Current monotonic timestamp.
#[inline(always)]
pub fn now() -> Instant {
    Instant::now()
}

/// Seconds from `start` to `end`, saturating at zero.
#[inline(always)]
pub fn elapsed(start: Instant, end: Instant) -> f64 {
    end.saturating_duration_since(start).as_secs_f64()
}

/// Measure the clock's effective granularity in microseconds.
///
/// Spins on [`now`] until the reading advances by at least one microsecond,
/// [`CALIBRATION_TRIALS`] times, and returns the smallest delta between
/// consecutive readings. Never returns less than 1.
pub fn calibrate_granularity() -> u64 {
    let mut found = [now(); CALIBRATION_TRIALS];
    let mut t1 = now();
    for slot in found.iter_mut() {
        let t2 = loop {
            let t2 = now();
            if elapsed(t1, t2) >= 1.0e-6 {
                break t2;
            }
        };
        *slot = t2;
        t1 = t2;
    }
    let min_delta = found
        .windows(2)
        .map(|w| w[1].saturating_duration_since(w[0]).as_micros() as u64)
        .min()
        .unwrap_or(1);
    min_delta.max(1)
}

/// Clock granularity with helpers to judge measurement reliability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Granularity {
    micros: u64,
}

impl Granularity {
    /// Calibrate against the running system.
    pub fn calibrate() -> Self {
        Self::from_micros(calibrate_granularity())
    }

    /// Wrap a known granularity; zero is treated as one microsecond.
    pub fn from_micros(micros: u64) -> Self {
        Self { micros: micros.max(1) }
    }

    pub fn micros(&self) -> u64 {
        self.micros
    }

    /// How many clock ticks a duration of `secs` spans.
    pub fn ticks(&self, secs: f64) -> u64 {
        (secs * 1.0e6 / self.micros as f64) as u64
    }

    /// True when `secs` spans at least [`MIN_TICKS_PER_TEST`] ticks.
    pub fn is_reliable(&self, secs: f64) -> bool {
        self.ticks(secs) >= MIN_TICKS_PER_TEST
    }
}

/// Start/stop timer around a region of code.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
    stop: Option<Instant>,
}

impl Stopwatch {
    #[inline(always)]
    pub fn start() -> Self {
        Self { start: now(), stop: None }
    }

    #[inline(always)]
    pub fn stop(&mut self) {
        self.stop = Some(now());
    }

    /// Seconds between start and stop (or now, if still running).
    #[inline(always)]
    pub fn elapsed_secs(&self) -> f64 {
        elapsed(self.start, self.stop.unwrap_or_else(now))
    }
}

/// Time one call of `f` in seconds.
#[inline]
pub fn time_it<F: FnOnce()>(f: F) -> f64 {
    let mut sw = Stopwatch::start();
    f();
    sw.stop();
    sw.elapsed_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_monotonic() {
        let mut prev = now();
        for _ in 0..10_000 {
            let next = now();
            assert!(next >= prev, "clock went backwards");
            assert!(elapsed(prev, next) >= 0.0);
            prev = next;
        }
    }

    #[test]
    fn test_elapsed_saturates() {
        let a = now();
        let b = now();
        assert!(elapsed(b, a) >= 0.0);
        assert!(elapsed(a, b) >= 0.0);
    }

    #[test]
    fn test_calibrate_granularity_at_least_one() {
        let g = calibrate_granularity();
        eprintln!("clock granularity: {g} us");
        assert!(g >= 1);
    }

    #[test]
    fn test_granularity_ticks() {
        let g = Granularity::from_micros(0);
        assert_eq!(g.micros(), 1);
        assert_eq!(g.ticks(20.5e-6), 20);
        assert!(g.is_reliable(25e-6));
        assert!(!g.is_reliable(5e-6));

        let coarse = Granularity::from_micros(10);
        assert_eq!(coarse.ticks(1.005e-3), 100);
        assert!(!coarse.is_reliable(100e-6));
    }

    #[test]
    fn test_stopwatch() {
        let secs = time_it(|| std::thread::sleep(std::time::Duration::from_millis(2)));
        assert!(secs >= 0.002);
        let mut sw = Stopwatch::start();
        sw.stop();
        let first = sw.elapsed_secs();
        assert_eq!(first, sw.elapsed_secs());
    }
}
