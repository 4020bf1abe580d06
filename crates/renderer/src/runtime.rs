use std::time::{Duration, Instant};

/// Nominal frame period of the viewer (roughly 60 Hz).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_micros(16_600);

/// Abstraction over where the `time_ms` uniform originates from.
pub trait Clock {
    /// Milliseconds since the clock's origin.
    fn now_ms(&mut self) -> f64;
}

/// Monotonic clock starting at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock frozen at a single timestamp, for still frames.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    time_ms: f64,
}

impl FixedClock {
    pub fn new(time_ms: f64) -> Self {
        Self { time_ms }
    }
}

impl Clock for FixedClock {
    fn now_ms(&mut self) -> f64 {
        self.time_ms
    }
}

/// Convenient alias for owning clocks behind trait objects.
pub type BoxedClock = Box<dyn Clock + Send>;

/// Running clock, or a frozen one when `still_time_ms` is set.
pub fn clock_for(still_time_ms: Option<f64>) -> BoxedClock {
    match still_time_ms {
        Some(time_ms) => Box::new(FixedClock::new(time_ms)),
        None => Box::new(SystemClock::new()),
    }
}

/// Fixed-period tick cadence for the event loop.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    interval: Duration,
    next: Option<Instant>,
}

impl TickSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    /// True when no tick has happened yet or the deadline has passed.
    pub fn ready(&self, now: Instant) -> bool {
        match self.next {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    /// Records a tick at `now`. A late tick does not try to catch up.
    pub fn mark_ticked(&mut self, now: Instant) {
        self.next = Some(now + self.interval);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next
    }
}

impl Default for TickSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_waits_one_interval_between_ticks() {
        let mut schedule = TickSchedule::new(Duration::from_millis(20));
        let start = Instant::now();
        assert!(schedule.ready(start));
        assert_eq!(schedule.next_deadline(), None);

        schedule.mark_ticked(start);
        assert!(!schedule.ready(start + Duration::from_millis(19)));
        assert!(schedule.ready(start + Duration::from_millis(20)));
        assert_eq!(
            schedule.next_deadline(),
            Some(start + Duration::from_millis(20))
        );
    }

    #[test]
    fn fixed_clock_never_moves() {
        let mut clock = clock_for(Some(1234.5));
        assert_eq!(clock.now_ms(), 1234.5);
        assert_eq!(clock.now_ms(), 1234.5);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let mut clock = SystemClock::new();
        let first = clock.now_ms();
        let second = clock.now_ms();
        assert!(first >= 0.0);
        assert!(second >= first);
    }
}
