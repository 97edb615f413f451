//! Synthetic capture source producing a moving test pattern

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::capture::frame::{chroma_height, chroma_width, Frame, FrameMetadata, FramePool};
use crate::capture::{CaptureError, FrameSource};
use crate::CaptureConfig;

/// Frame source that needs no camera: a diagonal luma ramp that shifts every frame.
pub struct PatternCapture {
    config: CaptureConfig,
    pool: FramePool,
    ticker: Option<Interval>,
    sequence: u64,
    dropped: u64,
}

impl PatternCapture {
    pub fn new(config: CaptureConfig) -> Self {
        info!(
            "Pattern capture {}x{} @ {} fps ({:?})",
            config.width, config.height, config.fps, config.format
        );
        let pool = FramePool::new(config.buffer_count.max(1) as usize);

        Self {
            config,
            pool,
            ticker: None,
            sequence: 0,
            dropped: 0,
        }
    }

    /// Captures skipped because no slot was free
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn render(&self, sequence: u64) -> Bytes {
        let (width, height) = (self.config.width, self.config.height);
        let mut data = Vec::with_capacity(self.config.format.frame_len(width, height));

        let shift = (sequence * 4) as usize;
        for y in 0..height as usize {
            for x in 0..width as usize {
                data.push(((x + y + shift) % 256) as u8);
            }
        }

        // Neutral chroma; identical bytes for every 4:2:0 layout
        let chroma = chroma_width(width) * chroma_height(height);
        data.resize(data.len() + 2 * chroma, 128);

        Bytes::from(data)
    }
}

#[async_trait]
impl FrameSource for PatternCapture {
    async fn capture_frame(&mut self) -> Result<Frame, CaptureError> {
        let period = Duration::from_secs_f64(1.0 / self.config.fps.max(1) as f64);

        loop {
            self.ticker
                .get_or_insert_with(|| {
                    let mut ticker = tokio::time::interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    ticker
                })
                .tick()
                .await;

            self.sequence += 1;

            let Some(slot) = self.pool.try_acquire() else {
                self.dropped += 1;
                debug!(sequence = self.sequence, "No free frame slot, skipping capture");
                continue;
            };

            let meta = FrameMetadata {
                sequence: self.sequence,
                width: self.config.width,
                height: self.config.height,
                stride: self.config.width,
                format: self.config.format,
                device_timestamp: None,
            };

            return Ok(Frame::new(self.render(self.sequence), meta, Instant::now()).with_slot(slot));
        }
    }

    fn pool(&self) -> &FramePool {
        &self.pool
    }
}
