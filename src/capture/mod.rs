pub mod frame;
pub mod pattern;
#[cfg(feature = "v4l2")]
pub mod v4l2;

use async_trait::async_trait;
use thiserror::Error;

pub use frame::{Frame, FrameMetadata, FramePool, FrameSlot, PixelFormat};
pub use pattern::PatternCapture;
#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Capture;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture stream not started")]
    NotStarted,
    #[error("capture device error: {0}")]
    Device(#[from] std::io::Error),
    #[error("unsupported capture setup: {0}")]
    Unsupported(String),
    #[error("capture buffer holds {actual} bytes, negotiated layout needs {expected}")]
    ShortBuffer { expected: usize, actual: usize },
}

/// Producer of camera frames.
///
/// Implementations hand out frames bound to a [`FramePool`] slot and skip
/// captures while every slot is still held downstream.
#[async_trait]
pub trait FrameSource: Send {
    async fn capture_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Pool the source draws its slots from.
    fn pool(&self) -> &FramePool;
}
