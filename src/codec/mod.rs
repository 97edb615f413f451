//! Frame → upload payload conversion
//!
//! An accepted frame goes through two JPEG passes before it leaves the device:
//! the raw 4:2:0 buffer is compressed once (capture quality), decoded back to
//! RGB, and compressed again (upload quality). The second JPEG is base64
//! encoded with the standard alphabet and no line wrapping so it can be
//! embedded directly in a JSON body.

pub mod jpeg;
pub mod yuv;

use std::time::Instant;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tracing::trace;

use crate::capture::Frame;
use crate::PipelineConfig;

pub use jpeg::{decode_jpeg, rgb_to_jpeg, RgbImage};
pub use yuv::planar_to_rgb;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("frame has zero width or height")]
    EmptyFrame,
    #[error("frame buffer too short: expected {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },
    #[error("JPEG encode failed: {0}")]
    JpegEncode(#[from] image::ImageError),
    #[error("JPEG decode failed: {0}")]
    JpegDecode(#[from] jpeg_decoder::Error),
    #[error("JPEG stream has no header")]
    MissingHeader,
    #[error("unsupported JPEG pixel format: {0}")]
    UnsupportedJpeg(String),
}

/// JPEG qualities for the two compression passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub capture_quality: u8,
    pub upload_quality: u8,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            capture_quality: 75,
            upload_quality: 80,
        }
    }
}

impl From<&PipelineConfig> for EncodeSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            capture_quality: config.capture_quality,
            upload_quality: config.upload_quality,
        }
    }
}

/// A frame that passed the rate limiter, ready for transport
#[derive(Debug, Clone)]
pub struct EncodedSample {
    pub sequence: u64,
    /// Base64 of the upload JPEG
    pub payload: String,
    pub jpeg_len: usize,
    pub width: u32,
    pub height: u32,
    pub accepted_at: Instant,
}

/// Encode an accepted frame. The frame is released as soon as its pixels have
/// been compressed, on success and on every error path.
pub fn encode_sample(
    frame: Frame,
    settings: EncodeSettings,
    accepted_at: Instant,
) -> Result<EncodedSample, CodecError> {
    let sequence = frame.meta.sequence;
    let (width, height) = (frame.width(), frame.height());

    let capture_jpeg = {
        let rgb = planar_to_rgb(&frame);
        frame.release();
        rgb_to_jpeg(&rgb?, width, height, settings.capture_quality)?
    };

    let image = decode_jpeg(&capture_jpeg)?;
    let upload_jpeg = rgb_to_jpeg(
        &image.pixels,
        image.width,
        image.height,
        settings.upload_quality,
    )?;
    trace!(
        sequence,
        capture_bytes = capture_jpeg.len(),
        upload_bytes = upload_jpeg.len(),
        "Sample encoded"
    );

    Ok(EncodedSample {
        sequence,
        payload: STANDARD.encode(&upload_jpeg),
        jpeg_len: upload_jpeg.len(),
        width: image.width,
        height: image.height,
        accepted_at,
    })
}
