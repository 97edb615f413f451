use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use jpeg_decoder::{Decoder, PixelFormat as JpegPixelFormat};

use crate::codec::CodecError;

/// Decoded JPEG as packed RGB24
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn rgb_to_jpeg(rgb: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).write_image(
        rgb,
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(buffer)
}

pub fn decode_jpeg(data: &[u8]) -> Result<RgbImage, CodecError> {
    let mut decoder = Decoder::new(data);
    let pixels = decoder.decode()?;
    let info = decoder.info().ok_or(CodecError::MissingHeader)?;

    let pixels = match info.pixel_format {
        JpegPixelFormat::RGB24 => pixels,
        JpegPixelFormat::L8 => pixels.iter().flat_map(|&l| [l, l, l]).collect(),
        other => return Err(CodecError::UnsupportedJpeg(format!("{other:?}"))),
    };

    Ok(RgbImage {
        pixels,
        width: info.width as u32,
        height: info.height as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| {
                let v = (i % 256) as u8;
                [v, v.wrapping_add(10), v.wrapping_add(20)]
            })
            .collect()
    }

    #[test]
    fn encode_then_decode_keeps_dimensions() {
        let jpeg = rgb_to_jpeg(&gradient(16, 8), 16, 8, 75).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let image = decode_jpeg(&jpeg).unwrap();
        assert_eq!((image.width, image.height), (16, 8));
        assert_eq!(image.pixels.len(), 16 * 8 * 3);
    }

    #[test]
    fn lower_quality_is_not_larger() {
        let rgb = gradient(64, 64);
        let low = rgb_to_jpeg(&rgb, 64, 64, 10).unwrap();
        let high = rgb_to_jpeg(&rgb, 64, 64, 95).unwrap();
        assert!(low.len() <= high.len());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_jpeg(b"not a jpeg"),
            Err(CodecError::JpegDecode(_))
        ));
    }
}
