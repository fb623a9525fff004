use image::{DynamicImage, RgbImage};
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};

use crate::error::CodecError;

/// Decoding and lossy encoding of raster images
pub trait ImageCodec {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError>;

    /// Encode opaque RGB pixels at `quality` (1-100)
    fn encode(&self, pixels: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError>;
}

/// Decodes through the `image` crate, encodes 4:2:0 JPEG with optimized
/// Huffman tables
#[derive(Debug, Clone, Copy)]
pub struct JpegCodec {
    optimize: bool,
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self { optimize: true }
    }
}

impl JpegCodec {
    /// Codec using the standard Huffman tables
    pub fn baseline() -> Self {
        Self { optimize: false }
    }
}

impl ImageCodec for JpegCodec {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, CodecError> {
        Ok(image::load_from_memory(data)?)
    }

    fn encode(&self, pixels: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        let (width, height) = pixels.dimensions();
        let too_large = || CodecError::TooLarge { width, height };
        let w = u16::try_from(width).map_err(|_| too_large())?;
        let h = u16::try_from(height).map_err(|_| too_large())?;

        let mut output = Vec::new();
        let mut encoder = Encoder::new(&mut output, quality.clamp(1, 100));
        encoder.set_sampling_factor(SamplingFactor::R_4_2_0);
        encoder.set_optimized_huffman_tables(self.optimize);
        encoder.encode(pixels.as_raw(), w, h, ColorType::Rgb)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 5 % 256) as u8, (y * 11 % 256) as u8, ((x ^ y) % 256) as u8])
        })
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let pixels = RgbImage::from_pixel(16, 16, Rgb([10, 120, 240]));
        let data = JpegCodec::default().encode(&pixels, 80).unwrap();
        assert!(data.starts_with(&[0xFF, 0xD8]));

        let decoded = JpegCodec::default().decode(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn test_optimized_tables_are_never_larger() {
        let pixels = gradient(200, 150);
        for quality in [95, 75, 50, 20] {
            let optimized = JpegCodec::default().encode(&pixels, quality).unwrap();
            let baseline = JpegCodec::baseline().encode(&pixels, quality).unwrap();
            assert!(
                optimized.len() <= baseline.len(),
                "quality {}: optimized {} > baseline {}",
                quality,
                optimized.len(),
                baseline.len()
            );
            assert!(image::load_from_memory(&optimized).is_ok());
        }
    }

    #[test]
    fn test_rejects_oversized_image() {
        let pixels = RgbImage::new(70_000, 1);
        assert!(matches!(
            JpegCodec::default().encode(&pixels, 80),
            Err(CodecError::TooLarge { width: 70_000, height: 1 })
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(JpegCodec::default().decode(b"not an image").is_err());
    }
}
