use std::thread;
use std::time::{Duration, Instant};

use crate::error::{PlayError, Result};

/// Fixed-rate tick source that paces the renderer.
///
/// A late tick fires immediately and the schedule restarts from that moment,
/// so a slow frame delays everything after it instead of causing a burst of
/// catch-up ticks.
#[derive(Debug)]
pub struct DisplayClock {
    interval: Duration,
    next: Instant,
}

impl DisplayClock {
    /// A clock ticking `fps` times per second, first tick one interval from now.
    pub fn new(fps: u32) -> Result<Self> {
        if fps == 0 {
            return Err(PlayError::Config("fps must be greater than zero".into()));
        }
        let interval = Duration::from_micros(1_000_000 / fps as u64);
        Ok(Self { interval, next: Instant::now() + interval })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleeps until the next tick. Returns how late the tick fired.
    pub fn wait(&mut self) -> Duration {
        let now = Instant::now();
        if let Some(remaining) = self.next.checked_duration_since(now) {
            thread::sleep(remaining);
        }
        let fired = Instant::now();
        let late = fired.saturating_duration_since(self.next);
        // Sleep overshoot within one interval stays on schedule.
        self.next = if late > self.interval { fired } else { self.next } + self.interval;
        late
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_fps_is_a_third_of_a_tenth_second() {
        let clock = DisplayClock::new(30).unwrap();
        assert_eq!(clock.interval(), Duration::from_micros(33_333));
    }

    #[test]
    fn zero_fps_is_rejected() {
        assert!(matches!(DisplayClock::new(0), Err(PlayError::Config(_))));
    }

    #[test]
    fn ticks_are_paced() {
        let mut clock = DisplayClock::new(100).unwrap();
        let start = Instant::now();
        for _ in 0..3 {
            clock.wait();
        }
        assert!(start.elapsed() >= Duration::from_millis(29));
    }

    #[test]
    fn a_late_tick_does_not_cause_a_burst() {
        let mut clock = DisplayClock::new(100).unwrap();
        thread::sleep(Duration::from_millis(60));
        let late = clock.wait();
        assert!(late >= Duration::from_millis(40));

        // The following tick waits a full interval again.
        let before = Instant::now();
        clock.wait();
        assert!(before.elapsed() >= Duration::from_millis(8));
    }
}
