//! Pipeline counters, mirrored to the `metrics` facade

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;

/// Lock-free counters shared by the sampling thread and submission tasks
#[derive(Default)]
pub struct PipelineStats {
    counters: CachePadded<Counters>,
}

#[derive(Default)]
struct Counters {
    frames_seen: AtomicU64,
    frames_rejected: AtomicU64,
    samples_accepted: AtomicU64,
    encode_failures: AtomicU64,
    samples_dropped: AtomicU64,
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicUsize,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_seen: u64,
    pub frames_rejected: u64,
    pub samples_accepted: u64,
    pub encode_failures: u64,
    pub samples_dropped: u64,
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub in_flight: usize,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_seen(&self) {
        self.counters.frames_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.counters.frames_rejected.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("fitbuddy_frames_total", "decision" => "rejected").increment(1);
    }

    pub(crate) fn record_accepted(&self) {
        self.counters.samples_accepted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("fitbuddy_frames_total", "decision" => "accepted").increment(1);
    }

    pub(crate) fn record_encode_failure(&self) {
        self.counters.encode_failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("fitbuddy_samples_total", "outcome" => "encode_failed").increment(1);
    }

    pub(crate) fn record_dropped(&self) {
        self.counters.samples_dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("fitbuddy_samples_total", "outcome" => "dropped").increment(1);
    }

    pub(crate) fn record_submitted(&self) {
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        let in_flight = self.counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::gauge!("fitbuddy_pose_in_flight").set(in_flight as f64);
    }

    pub(crate) fn record_completed(&self, success: bool) {
        if success {
            self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("fitbuddy_samples_total", "outcome" => "succeeded").increment(1);
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("fitbuddy_samples_total", "outcome" => "failed").increment(1);
        }
        let in_flight = self.counters.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
        metrics::gauge!("fitbuddy_pose_in_flight").set(in_flight as f64);
    }

    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let c = &self.counters;
        StatsSnapshot {
            frames_seen: c.frames_seen.load(Ordering::Relaxed),
            frames_rejected: c.frames_rejected.load(Ordering::Relaxed),
            samples_accepted: c.samples_accepted.load(Ordering::Relaxed),
            encode_failures: c.encode_failures.load(Ordering::Relaxed),
            samples_dropped: c.samples_dropped.load(Ordering::Relaxed),
            submitted: c.submitted.load(Ordering::Relaxed),
            succeeded: c.succeeded.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            in_flight: c.in_flight.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_tracks_submissions() {
        let stats = PipelineStats::new();
        stats.record_submitted();
        stats.record_submitted();
        stats.record_completed(true);
        assert_eq!(stats.in_flight(), 1);

        stats.record_completed(false);
        let snap = stats.snapshot();
        assert_eq!(snap.submitted, 2);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.in_flight, 0);
    }
}
