use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source.
///
/// `now` is an offset from the clock's own origin. Readings from different
/// clocks are not comparable.
pub trait Clock {
    fn now(&self) -> Duration;

    /// Time since `start`, saturating at zero.
    fn elapsed_since(&self, start: Duration) -> Duration {
        self.now().saturating_sub(start)
    }
}

/// Wall-clock source backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to the policy under test.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.0.store(as_nanos(now), Ordering::SeqCst);
    }

    /// Negative and NaN readings clamp to zero, readings past `Duration`'s
    /// range saturate.
    pub fn set_secs(&self, secs: f64) {
        self.set(Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX));
    }

    pub fn advance(&self, delta: Duration) {
        let delta = as_nanos(delta);
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(delta))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.0.load(Ordering::SeqCst))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

fn as_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero() {
        assert_eq!(ManualClock::new().now(), Duration::ZERO);
    }

    #[test]
    fn manual_clock_clones_share_state() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance(Duration::from_millis(250));
        handle.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(500));

        clock.set_secs(2.0);
        assert_eq!(handle.now(), Duration::from_secs(2));
    }

    #[test]
    fn set_secs_clamps_out_of_range_readings() {
        let clock = ManualClock::new();

        clock.set_secs(-3.0);
        assert_eq!(clock.now(), Duration::ZERO);

        clock.set_secs(f64::NAN);
        assert_eq!(clock.now(), Duration::ZERO);

        clock.set_secs(f64::INFINITY);
        assert_eq!(clock.now(), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn elapsed_saturates_when_start_is_in_the_future() {
        let clock = ManualClock::new();
        clock.set_secs(1.0);
        assert_eq!(clock.elapsed_since(Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
