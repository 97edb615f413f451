use std::time::{Duration, Instant};

/// Pausable countdown driven by explicit clock readings.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    total: Duration,
    /// Remaining time as of `resumed_at` (or the pause point)
    banked: Duration,
    resumed_at: Option<Instant>,
}

impl CountdownTimer {
    /// A paused timer holding `total`.
    pub fn new(total: Duration) -> Self {
        Self {
            total,
            banked: total,
            resumed_at: None,
        }
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn is_running(&self) -> bool {
        self.resumed_at.is_some()
    }

    pub fn start(&mut self, now: Instant) {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(now);
        }
    }

    /// Same as [`start`](Self::start); reads better after a pause.
    pub fn resume(&mut self, now: Instant) {
        self.start(now);
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.resumed_at.take() {
            self.banked = self.banked.saturating_sub(now.saturating_duration_since(since));
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        match self.resumed_at {
            Some(since) => self.banked.saturating_sub(now.saturating_duration_since(since)),
            None => self.banked,
        }
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }
}

/// `MM:SS`, whole seconds only.
pub fn format_clock(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_while_running() {
        let start = Instant::now();
        let mut timer = CountdownTimer::new(Duration::from_secs(30));
        assert_eq!(timer.remaining(start + Duration::from_secs(5)), Duration::from_secs(30));

        timer.start(start);
        assert_eq!(timer.remaining(start + Duration::from_secs(5)), Duration::from_secs(25));
        assert!(timer.is_finished(start + Duration::from_secs(31)));
    }

    #[test]
    fn pause_freezes_remaining() {
        let start = Instant::now();
        let mut timer = CountdownTimer::new(Duration::from_secs(30));
        timer.start(start);
        timer.pause(start + Duration::from_secs(10));
        assert_eq!(timer.remaining(start + Duration::from_secs(60)), Duration::from_secs(20));

        timer.resume(start + Duration::from_secs(60));
        assert_eq!(timer.remaining(start + Duration::from_secs(65)), Duration::from_secs(15));
        assert!(timer.is_running());
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(Duration::from_secs(90)), "01:30");
        assert_eq!(format_clock(Duration::from_millis(59_200)), "00:59");
        assert_eq!(format_clock(Duration::from_millis(29_990)), "00:29");
        assert_eq!(format_clock(Duration::ZERO), "00:00");
    }
}
