//! Planar 4:2:0 → packed RGB conversion

use crate::capture::frame::{chroma_height, Frame, PixelFormat};
use crate::codec::CodecError;

/// Convert a 4:2:0 frame to RGB24 with BT.601 coefficients:
/// - R = Y + 1.402 * (V - 128)
/// - G = Y - 0.344 * (U - 128) - 0.714 * (V - 128)
/// - B = Y + 1.772 * (U - 128)
///
/// Honors the luma stride in the frame metadata; chroma planes are assumed to
/// use the matching half stride (I420) or the full stride (NV12/NV21).
pub fn planar_to_rgb(frame: &Frame) -> Result<Vec<u8>, CodecError> {
    let meta = &frame.meta;
    let (width, height) = (meta.width as usize, meta.height as usize);
    if width == 0 || height == 0 {
        return Err(CodecError::EmptyFrame);
    }

    let y_stride = (meta.stride as usize).max(width);
    let ch = chroma_height(meta.height);
    let y_len = y_stride * height;

    let c_stride = match meta.format {
        PixelFormat::I420 => (y_stride + 1) / 2,
        PixelFormat::Nv12 | PixelFormat::Nv21 => 2 * ((y_stride + 1) / 2),
    };
    let required = meta.format.strided_len(meta.width, meta.height, meta.stride);

    let data = &frame.data[..];
    if data.len() < required {
        return Err(CodecError::ShortBuffer {
            expected: required,
            actual: data.len(),
        });
    }

    let luma = &data[..y_len];
    let chroma = &data[y_len..];
    let mut rgb = Vec::with_capacity(width * height * 3);

    for row in 0..height {
        let crow = row / 2;
        for col in 0..width {
            let ccol = col / 2;
            let (u, v) = match meta.format {
                PixelFormat::I420 => {
                    let u = chroma[crow * c_stride + ccol];
                    let v = chroma[c_stride * ch + crow * c_stride + ccol];
                    (u, v)
                }
                PixelFormat::Nv12 => {
                    let at = crow * c_stride + 2 * ccol;
                    (chroma[at], chroma[at + 1])
                }
                PixelFormat::Nv21 => {
                    let at = crow * c_stride + 2 * ccol;
                    (chroma[at + 1], chroma[at])
                }
            };

            let y = luma[row * y_stride + col] as f32;
            let u = u as f32 - 128.0;
            let v = v as f32 - 128.0;

            rgb.push((y + 1.402 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8);
            rgb.push((y + 1.772 * u).clamp(0.0, 255.0) as u8);
        }
    }

    Ok(rgb)
}
