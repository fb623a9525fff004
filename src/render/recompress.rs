//! Image re-encoding
//!
//! Every output is opaque 8-bit RGB JPEG: transparency is composited onto
//! white first, then the image is optionally downscaled with Lanczos3.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

use crate::engine::{ImageCodec, JpegCodec, RasterImage};
use crate::error::CodecError;

/// Scales tried by [`ImageRecompressor::fit_to_size`] once quality alone is not enough
const FIT_SCALES: [f32; 6] = [0.9, 0.8, 0.7, 0.6, 0.5, 0.4];

/// Last-resort scale when nothing fits
const FIT_FALLBACK_SCALE: f32 = 0.3;

const FIT_START_QUALITY: u8 = 95;
const FIT_RESIZED_START_QUALITY: u8 = 85;
const FIT_QUALITY_STEP: usize = 5;

pub struct ImageRecompressor<C = JpegCodec> {
    codec: C,
}

impl Default for ImageRecompressor<JpegCodec> {
    fn default() -> Self {
        Self::new(JpegCodec::default())
    }
}

impl<C: ImageCodec> ImageRecompressor<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Re-encode `data` at `quality`, shrinking by `scale` when below 1.0.
    ///
    /// Never fails: if the image cannot be decoded or encoded the original
    /// bytes are returned.
    pub fn recompress(&self, data: &[u8], quality: u8, scale: f32) -> Vec<u8> {
        let result = self
            .codec
            .decode(data)
            .and_then(|image| self.encode_image(&image, quality, scale));
        match result {
            Ok(raster) => raster.data,
            Err(e) => {
                log::warn!("Could not compress image, keeping original: {}", e);
                data.to_vec()
            }
        }
    }

    /// Flatten, resize and encode already decoded pixels
    pub fn encode_image(
        &self,
        image: &DynamicImage,
        quality: u8,
        scale: f32,
    ) -> Result<RasterImage, CodecError> {
        let mut pixels = flatten_to_rgb(image);
        if scale < 1.0 {
            pixels = resize(&pixels, scale)?;
        }
        let data = self.codec.encode(&pixels, quality.clamp(1, 100))?;
        Ok(RasterImage {
            data,
            width: pixels.width(),
            height: pixels.height(),
        })
    }

    /// Find an encoding of `data` no larger than `target_size` bytes.
    ///
    /// Lowers quality first, then size. If nothing fits, returns a 0.3-scale
    /// encoding at `min_quality`; if the image cannot be processed, returns
    /// the original bytes.
    pub fn fit_to_size(&self, data: &[u8], target_size: usize, min_quality: u8) -> Vec<u8> {
        match self.try_fit_to_size(data, target_size, min_quality.clamp(1, 100)) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::warn!("Could not fit image to {} bytes: {}", target_size, e);
                data.to_vec()
            }
        }
    }

    fn try_fit_to_size(
        &self,
        data: &[u8],
        target_size: usize,
        min_quality: u8,
    ) -> Result<Vec<u8>, CodecError> {
        let pixels = flatten_to_rgb(&self.codec.decode(data)?);

        for quality in descending_qualities(FIT_START_QUALITY, min_quality) {
            let encoded = self.codec.encode(&pixels, quality)?;
            if encoded.len() <= target_size {
                return Ok(encoded);
            }
        }

        for scale in FIT_SCALES {
            let resized = resize(&pixels, scale)?;
            for quality in descending_qualities(FIT_RESIZED_START_QUALITY, min_quality) {
                let encoded = self.codec.encode(&resized, quality)?;
                if encoded.len() <= target_size {
                    log::debug!("Image fits at scale {:.1}, quality {}", scale, quality);
                    return Ok(encoded);
                }
            }
        }

        let resized = resize(&pixels, FIT_FALLBACK_SCALE)?;
        self.codec.encode(&resized, min_quality)
    }
}

fn descending_qualities(start: u8, min_quality: u8) -> impl Iterator<Item = u8> {
    (min_quality..=start).rev().step_by(FIT_QUALITY_STEP)
}

/// Convert to opaque RGB, compositing any alpha onto white
pub fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Resize by `scale`, truncating the new dimensions toward zero
fn resize(pixels: &RgbImage, scale: f32) -> Result<RgbImage, CodecError> {
    let width = (pixels.width() as f32 * scale) as u32;
    let height = (pixels.height() as f32 * scale) as u32;
    if width == 0 || height == 0 {
        return Err(CodecError::EmptyImage {
            width: pixels.width(),
            height: pixels.height(),
            scale,
        });
    }
    Ok(imageops::resize(pixels, width, height, FilterType::Lanczos3))
}
