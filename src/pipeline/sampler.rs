use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::api::PoseAnalyzer;
use crate::capture::Frame;
use crate::codec::{encode_sample, EncodeSettings, EncodedSample};
use crate::pipeline::launcher::{LaunchSlot, SubmissionLauncher};
use crate::pipeline::limiter::RateLimiter;
use crate::pipeline::stats::PipelineStats;
use crate::sink::ResultSink;
use crate::PipelineConfig;

/// What happened to one frame handed to [`PoseSampler::on_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    /// Too soon after the last accepted sample
    Rejected,
    /// Encoded and handed to a submission task
    Submitted,
    /// Accepted but the pixels could not be encoded
    EncodeFailed,
    /// Accepted but the in-flight cap was reached
    Dropped,
}

/// Rate-limited bridge from the frame source to remote pose analysis.
///
/// `on_frame` runs on the frame-processing thread and never waits on the
/// network: the analysis call for an accepted sample is spawned onto the
/// runtime handed to [`PoseSampler::new`]. Results go to the sink in
/// completion order, so a slow early response can overwrite a newer one.
/// Failures are logged and otherwise ignored; nothing is retried.
pub struct PoseSampler {
    limiter: RateLimiter,
    settings: EncodeSettings,
    analyzer: Arc<dyn PoseAnalyzer>,
    sink: Arc<dyn ResultSink>,
    launcher: SubmissionLauncher,
    stats: Arc<PipelineStats>,
}

impl PoseSampler {
    pub fn new(
        config: &PipelineConfig,
        analyzer: Arc<dyn PoseAnalyzer>,
        sink: Arc<dyn ResultSink>,
        runtime: Handle,
    ) -> Self {
        Self {
            limiter: RateLimiter::new(config.min_interval()),
            settings: EncodeSettings::from(config),
            analyzer,
            sink,
            launcher: SubmissionLauncher::new(runtime, config.max_in_flight),
            stats: Arc::new(PipelineStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    pub fn on_frame(&mut self, frame: Frame) -> FrameDecision {
        self.on_frame_at(frame, Instant::now())
    }

    /// [`on_frame`](Self::on_frame) with the clock reading supplied by the caller.
    pub fn on_frame_at(&mut self, frame: Frame, now: Instant) -> FrameDecision {
        self.stats.record_seen();

        if !self.limiter.admit(now) {
            frame.release();
            self.stats.record_rejected();
            return FrameDecision::Rejected;
        }
        self.stats.record_accepted();

        let Some(slot) = self.launcher.try_reserve() else {
            debug!(sequence = frame.meta.sequence, "In-flight cap reached, dropping sample");
            frame.release();
            self.stats.record_dropped();
            return FrameDecision::Dropped;
        };

        let sample = match encode_sample(frame, self.settings, now) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Failed to encode sample: {}", e);
                self.stats.record_encode_failure();
                return FrameDecision::EncodeFailed;
            }
        };
        trace!(
            sequence = sample.sequence,
            bytes = sample.jpeg_len,
            "Submitting sample"
        );

        self.stats.record_submitted();
        self.launcher.launch(submit(
            self.analyzer.clone(),
            self.sink.clone(),
            self.stats.clone(),
            sample,
            slot,
        ));
        FrameDecision::Submitted
    }
}

async fn submit(
    analyzer: Arc<dyn PoseAnalyzer>,
    sink: Arc<dyn ResultSink>,
    stats: Arc<PipelineStats>,
    sample: EncodedSample,
    slot: LaunchSlot,
) {
    let sequence = sample.sequence;
    let started = Instant::now();

    let result = analyzer.analyze(sample.payload).await;
    // Free the in-flight permit before anything observes completion
    drop(slot);

    match result {
        Ok(analysis) => {
            debug!(
                sequence,
                knee = analysis.knee_angle,
                hip = analysis.hip_angle,
                torso = analysis.torso_tilt,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pose analysis"
            );
            sink.deliver(&analysis.feedback);
            stats.record_completed(true);
        }
        Err(e) => {
            warn!(sequence, "Pose analysis failed: {}", e);
            stats.record_completed(false);
        }
    }
}
