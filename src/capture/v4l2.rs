//! V4L2 camera capture delivering planar YU12 frames

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, instrument, warn};
use v4l::buffer::Type;
use v4l::capability::Flags as CapFlags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::MmapStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::capture::frame::{Frame, FrameMetadata, FramePool, PixelFormat};
use crate::capture::{CaptureError, FrameSource};
use crate::CaptureConfig;

/// Frame geometry the driver actually applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    width: u32,
    height: u32,
    stride: u32,
}

impl Layout {
    fn negotiated(applied: &v4l::Format) -> Self {
        Self {
            width: applied.width,
            height: applied.height,
            stride: applied.stride.max(applied.width),
        }
    }
}

/// V4L2 capture
pub struct V4l2Capture {
    device: Box<Device>,
    stream: Option<MmapStream<'static>>,
    config: CaptureConfig,
    layout: Layout,
    pool: FramePool,
    sequence: u64,
}

impl V4l2Capture {
    pub fn new(config: CaptureConfig) -> Result<Self, CaptureError> {
        info!("Initializing V4L2 capture: {}", config.device);

        let device = Device::with_path(&config.device)?;

        let caps = device.query_caps()?;
        info!("Device: {} ({})", caps.card, caps.driver);

        if !caps.capabilities.contains(CapFlags::VIDEO_CAPTURE) {
            return Err(CaptureError::Unsupported(
                "device doesn't support video capture".into(),
            ));
        }

        let mut fmt = device.format()?;
        fmt.width = config.width;
        fmt.height = config.height;
        fmt.fourcc = match config.format {
            PixelFormat::I420 => FourCC::new(b"YU12"),
            PixelFormat::Nv12 => FourCC::new(b"NV12"),
            PixelFormat::Nv21 => FourCC::new(b"NV21"),
        };

        let applied = device.set_format(&fmt)?;
        if applied.fourcc != fmt.fourcc {
            return Err(CaptureError::Unsupported(format!(
                "device negotiated {} instead of {}",
                applied.fourcc, fmt.fourcc
            )));
        }

        let layout = Layout::negotiated(&applied);
        if (layout.width, layout.height) != (config.width, config.height) {
            warn!(
                "Requested {}x{}, device applied {}x{}",
                config.width, config.height, layout.width, layout.height
            );
        }
        info!("Capture layout: {:?}", layout);

        let pool = FramePool::new(config.buffer_count.max(1) as usize);

        Ok(Self {
            device: Box::new(device),
            stream: None,
            config,
            layout,
            pool,
            sequence: 0,
        })
    }

    /// Start streaming with memory-mapped buffers
    pub fn start_stream(&mut self) -> Result<(), CaptureError> {
        let stream =
            MmapStream::with_buffers(&self.device, Type::VideoCapture, self.config.buffer_count)?;

        self.stream = Some(stream);
        info!(
            "Capture stream started with {} buffers",
            self.config.buffer_count
        );
        Ok(())
    }
}

#[async_trait]
impl FrameSource for V4l2Capture {
    #[instrument(skip(self))]
    async fn capture_frame(&mut self) -> Result<Frame, CaptureError> {
        loop {
            let stream = self.stream.as_mut().ok_or(CaptureError::NotStarted)?;

            let (buf, meta) = stream.next()?;
            let timestamp = Instant::now();
            self.sequence += 1;

            // Keep only the latest: skip while consumers still hold every slot
            let Some(slot) = self.pool.try_acquire() else {
                debug!(sequence = self.sequence, "No free frame slot, skipping capture");
                continue;
            };

            let Layout {
                width,
                height,
                stride,
            } = self.layout;
            let expected = self.config.format.strided_len(width, height, stride);
            if buf.len() < expected {
                return Err(CaptureError::ShortBuffer {
                    expected,
                    actual: buf.len(),
                });
            }

            // The mmap'd buffer is requeued on the next dequeue, so copy out
            let data = Bytes::copy_from_slice(&buf[..expected]);

            let frame_meta = FrameMetadata {
                sequence: self.sequence,
                width,
                height,
                stride,
                format: self.config.format,
                device_timestamp: Some(
                    Duration::from_secs(meta.timestamp.sec as u64)
                        + Duration::from_micros(meta.timestamp.usec as u64),
                ),
            };

            return Ok(Frame::new(data, frame_meta, timestamp).with_slot(slot));
        }
    }

    fn pool(&self) -> &FramePool {
        &self.pool
    }
}
