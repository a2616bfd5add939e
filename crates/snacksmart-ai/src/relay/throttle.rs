use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(80);

/// True once strictly more than `interval` has passed since `last`.
pub fn should_fire(now: Instant, last: Instant, interval: Duration) -> bool {
    now.saturating_duration_since(last) > interval
}

/// Rate limiter for partial commits.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    interval: Duration,
    last: Instant,
}

impl Throttle {
    /// Start the clock now.
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true and resets the clock when a commit may fire at `now`.
    pub fn ready(&mut self, now: Instant) -> bool {
        if should_fire(now, self.last, self.interval) {
            self.last = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_fire_is_strict() {
        let last = Instant::now();
        let interval = Duration::from_millis(80);
        assert!(!should_fire(last, last, interval));
        assert!(!should_fire(last + Duration::from_millis(79), last, interval));
        assert!(!should_fire(last + interval, last, interval));
        assert!(should_fire(last + Duration::from_millis(81), last, interval));
    }

    #[test]
    fn test_clock_going_backwards_never_fires() {
        let now = Instant::now();
        let later = now + Duration::from_secs(1);
        assert!(!should_fire(now, later, Duration::ZERO));
    }

    #[test]
    fn test_ready_resets_clock() {
        let start = Instant::now();
        let mut throttle = Throttle::starting_at(DEFAULT_THROTTLE_INTERVAL, start);

        assert!(!throttle.ready(start + Duration::from_millis(50)));
        assert!(throttle.ready(start + Duration::from_millis(90)));
        assert!(!throttle.ready(start + Duration::from_millis(160)));
        assert!(throttle.ready(start + Duration::from_millis(171)));
        assert_eq!(throttle.interval(), Duration::from_millis(80));
    }
}
