//! Pose sampling pipeline: rate limiting, encoding and fire-and-forget upload

pub mod launcher;
pub mod limiter;
pub mod sampler;
pub mod stats;

use std::thread;

use flume::Receiver;
use tracing::info;

use crate::capture::Frame;

pub use launcher::{LaunchSlot, SubmissionLauncher};
pub use limiter::RateLimiter;
pub use sampler::{FrameDecision, PoseSampler};
pub use stats::{PipelineStats, StatsSnapshot};

/// Run the sampler on a dedicated frame-processing thread.
///
/// Frames are handled one at a time in arrival order. The thread exits once
/// every sender of `frames` is gone; submissions still in flight are left to
/// finish on the runtime.
pub fn spawn_sampler(
    mut sampler: PoseSampler,
    frames: Receiver<Frame>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("pose-sampler".into())
        .spawn(move || {
            for frame in frames.iter() {
                sampler.on_frame(frame);
            }
            info!("Frame source closed: {:?}", sampler.stats().snapshot());
        })
}
