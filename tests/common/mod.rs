#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use fitbuddy::api::{ApiError, PoseAnalysis, PoseAnalyzer};
use fitbuddy::capture::{Frame, FrameMetadata, FramePool, PixelFormat};
use fitbuddy::pipeline::PipelineStats;
use fitbuddy::PipelineConfig;

pub const WIDTH: u32 = 16;
pub const HEIGHT: u32 = 12;

pub fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        min_interval_ms: 700,
        capture_quality: 75,
        upload_quality: 80,
        max_in_flight: None,
        frame_queue: 1,
    }
}

/// A mid-gray I420 frame holding a slot from `pool`.
pub fn frame(pool: &FramePool, sequence: u64) -> Frame {
    shaded_frame(pool, sequence, 128)
}

/// A uniform gray I420 frame of brightness `luma` holding a slot from `pool`.
pub fn shaded_frame(pool: &FramePool, sequence: u64, luma: u8) -> Frame {
    let meta = FrameMetadata {
        sequence,
        width: WIDTH,
        height: HEIGHT,
        stride: WIDTH,
        format: PixelFormat::I420,
        device_timestamp: None,
    };
    let luma_len = (WIDTH * HEIGHT) as usize;
    let mut data = vec![luma; luma_len];
    data.resize(PixelFormat::I420.frame_len(WIDTH, HEIGHT), 128);
    Frame::new(Bytes::from(data), meta, Instant::now())
        .with_slot(pool.try_acquire().expect("frame slot leaked"))
}

pub fn analysis(feedback: &str) -> PoseAnalysis {
    PoseAnalysis {
        knee_angle: 170.2,
        hip_angle: 95.0,
        torso_tilt: 3.1,
        feedback: feedback.to_owned(),
    }
}

pub type Scripted = (Duration, Result<PoseAnalysis, u16>);

/// Analyzer that answers each call from a script: a delay, then either a
/// result or an HTTP status error. Calls past the end of the script fail.
pub struct ScriptedAnalyzer {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoseAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, image_base64: String) -> Result<PoseAnalysis, ApiError> {
        assert!(!image_base64.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();

        let (delay, outcome) = next.unwrap_or((Duration::ZERO, Err(599)));
        tokio::time::sleep(delay).await;
        outcome.map_err(|status| ApiError::Status {
            status,
            body: String::new(),
        })
    }
}

/// Analyzer that picks its reply by looking at the uploaded image: the reply
/// whose shade is closest to the brightness of the decoded JPEG wins. Replies
/// are bound to the frame they were submitted for, whatever order calls
/// arrive in.
pub struct ShadeAnalyzer {
    replies: Vec<(u8, Duration, PoseAnalysis)>,
}

impl ShadeAnalyzer {
    pub fn new(replies: Vec<(u8, Duration, PoseAnalysis)>) -> Arc<Self> {
        Arc::new(Self { replies })
    }
}

#[async_trait]
impl PoseAnalyzer for ShadeAnalyzer {
    async fn analyze(&self, image_base64: String) -> Result<PoseAnalysis, ApiError> {
        let jpeg = STANDARD.decode(image_base64).expect("payload is not base64");
        let pixels = jpeg_decoder::Decoder::new(&jpeg[..])
            .decode()
            .expect("payload is not a JPEG");
        let shade = pixels[0];

        let (_, delay, reply) = self
            .replies
            .iter()
            .min_by_key(|(s, _, _)| s.abs_diff(shade))
            .expect("no replies scripted");
        tokio::time::sleep(*delay).await;
        Ok(reply.clone())
    }
}

/// Poll until every submission has finished.
pub async fn settle(stats: &PipelineStats, expected_completed: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snap = stats.snapshot();
            if snap.in_flight == 0 && snap.succeeded + snap.failed >= expected_completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("submissions did not settle");
}
