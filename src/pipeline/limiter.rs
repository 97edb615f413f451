use std::time::{Duration, Instant};

/// Minimum-interval gate for accepted samples.
///
/// Spacing is measured from the last *accepted* frame; rejected frames leave
/// the state untouched. The first frame is always accepted.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    last_accepted: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: None,
        }
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }

    /// Decide for a frame seen at `now`. Accepting records `now`.
    pub fn admit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}
