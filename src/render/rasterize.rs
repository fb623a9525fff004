//! Whole-page rasterization

use crate::config::defaults::BASE_DPI;
use crate::engine::{ImageCodec, JpegCodec, RasterImage, SourceDocument};
use crate::error::CandidateError;
use crate::model::PageSize;

use super::recompress::ImageRecompressor;

/// A page flattened to a single JPEG
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPage {
    pub image: RasterImage,
    /// Page size for the rebuilt document (original size times scale)
    pub size: PageSize,
}

/// Render zoom (pixels per point) for a resolution and scale
pub fn zoom_for(dpi: f32, scale: f32) -> f32 {
    dpi / BASE_DPI * scale
}

pub struct PageRasterizer<C = JpegCodec> {
    recompressor: ImageRecompressor<C>,
}

impl<C: ImageCodec> PageRasterizer<C> {
    pub fn new(recompressor: ImageRecompressor<C>) -> Self {
        Self { recompressor }
    }

    /// Render page `index` at `dpi` × `scale` and encode it at `quality`.
    ///
    /// Render and encode errors are returned to the caller; there is no
    /// original image to fall back to.
    pub fn rasterize<D: SourceDocument>(
        &self,
        document: &D,
        index: usize,
        dpi: f32,
        scale: f32,
        quality: u8,
    ) -> Result<RasterPage, CandidateError> {
        let size = document.page_size(index)?;
        let zoom = zoom_for(dpi, scale);
        let pixels = document.render_page(index, zoom)?;
        let image = self.recompressor.encode_image(&pixels, quality, 1.0)?;

        log::debug!(
            "Rasterized page {} at {:.0} DPI, scale {:.1}: {}x{} px, {} bytes",
            index,
            dpi,
            scale,
            image.width,
            image.height,
            image.data.len()
        );

        Ok(RasterPage {
            image,
            size: size.scaled(scale),
        })
    }
}
