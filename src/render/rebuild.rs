//! Candidate document assembly
//!
//! A rebuild never touches the source: every candidate gets a fresh
//! document from the engine, filled page by page.

use std::io::Write;

use crate::config::defaults::{BASE_DPI, RASTER_QUALITY};
use crate::engine::{
    DocumentBuilder, ImageCodec, JpegCodec, PdfEngine, SaveOptions, SourceDocument,
};
use crate::error::CandidateError;
use crate::model::{Candidate, RebuildMode};

use super::rasterize::PageRasterizer;
use super::recompress::ImageRecompressor;

pub struct DocumentRebuilder<C = JpegCodec> {
    rasterizer: PageRasterizer<C>,
}

impl Default for DocumentRebuilder<JpegCodec> {
    fn default() -> Self {
        Self::new(JpegCodec::default())
    }
}

impl<C: ImageCodec> DocumentRebuilder<C> {
    pub fn new(codec: C) -> Self {
        Self {
            rasterizer: PageRasterizer::new(ImageRecompressor::new(codec)),
        }
    }

    /// Build the document `candidate` describes from `source`
    pub fn rebuild<E: PdfEngine>(
        &self,
        engine: &E,
        source: &E::Document,
        candidate: &Candidate,
    ) -> Result<E::Builder, CandidateError> {
        let mut output = engine.new_document();
        let scale = candidate.scale;

        for index in 0..source.page_count() {
            match candidate.mode {
                RebuildMode::ImageRecompress { quality } => {
                    if source.image_count(index)? > 0 {
                        let page =
                            self.rasterizer
                                .rasterize(source, index, BASE_DPI, scale, quality)?;
                        output.add_image_page(page.size, &page.image)?;
                    } else {
                        let size = source.page_size(index)?.scaled(scale);
                        output.add_source_page(size, source, index)?;
                    }
                }
                RebuildMode::FullRerender { dpi } => {
                    let page = self.rasterizer.rasterize(
                        source,
                        index,
                        dpi as f32,
                        scale,
                        RASTER_QUALITY,
                    )?;
                    output.add_image_page(page.size, &page.image)?;
                }
            }
        }

        log::debug!("Rebuilt {} pages for {}", output.page_count(), candidate);
        Ok(output)
    }

    /// Rebuild and serialize with full structural cleanup
    pub fn rebuild_to<E: PdfEngine, W: Write>(
        &self,
        engine: &E,
        source: &E::Document,
        candidate: &Candidate,
        writer: &mut W,
    ) -> Result<(), CandidateError> {
        let document = self.rebuild(engine, source, candidate)?;
        document.save_to(writer, &SaveOptions::default())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::BuiltPage;
    use crate::engine::{EmbeddedImage, MemoryDocument, MemoryEngine, MemoryPage};
    use crate::error::{CodecError, EngineError};
    use crate::model::PageSize;
    use image::{DynamicImage, RgbImage};

    /// Encodes to `width * height * quality / 100` bytes
    struct PixelCountCodec;

    impl ImageCodec for PixelCountCodec {
        fn decode(&self, _data: &[u8]) -> Result<DynamicImage, CodecError> {
            Ok(DynamicImage::ImageRgb8(RgbImage::new(1, 1)))
        }

        fn encode(&self, pixels: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError> {
            let len = pixels.width() as usize * pixels.height() as usize * quality as usize / 100;
            Ok(vec![0; len])
        }
    }

    fn photo() -> EmbeddedImage {
        EmbeddedImage {
            width: 400,
            height: 300,
            encoded_len: 50_000,
        }
    }

    fn mixed_document() -> MemoryDocument {
        MemoryDocument::new(vec![
            MemoryPage::text(PageSize::new(612.0, 792.0), 3_000),
            MemoryPage::with_image(PageSize::new(200.0, 100.0), photo(), 500),
        ])
    }

    fn rebuild(document: &MemoryDocument, candidate: Candidate) -> Vec<BuiltPage> {
        let engine = MemoryEngine::new(document.clone());
        DocumentRebuilder::new(PixelCountCodec)
            .rebuild(&engine, document, &candidate)
            .unwrap()
            .pages()
            .to_vec()
    }

    #[test]
    fn test_image_free_page_is_copied_at_scaled_size() {
        let pages = rebuild(&mixed_document(), Candidate::image_recompress(75, 0.5));
        match &pages[0] {
            BuiltPage::Copied {
                size,
                source_index,
                content_len,
            } => {
                assert_eq!(*size, PageSize::new(306.0, 396.0));
                assert_eq!(*source_index, 0);
                assert_eq!(*content_len, 3_000);
            }
            other => panic!("expected copied page, got {:?}", other),
        }
    }

    #[test]
    fn test_image_page_is_rasterized_at_72_dpi() {
        let pages = rebuild(&mixed_document(), Candidate::image_recompress(50, 0.5));
        match &pages[1] {
            BuiltPage::Raster { size, image } => {
                assert_eq!(*size, PageSize::new(100.0, 50.0));
                assert_eq!((image.width, image.height), (100, 50));
                assert_eq!(image.data.len(), 100 * 50 / 2);
            }
            other => panic!("expected raster page, got {:?}", other),
        }
    }

    #[test]
    fn test_full_rerender_rasterizes_every_page() {
        let pages = rebuild(&mixed_document(), Candidate::full_rerender(144, 1.0));
        assert_eq!(pages.len(), 2);
        for (page, expected) in pages.iter().zip([(1224, 1584), (400, 200)]) {
            match page {
                BuiltPage::Raster { image, .. } => {
                    assert_eq!((image.width, image.height), expected);
                    let pixels = (expected.0 * expected.1) as usize;
                    assert_eq!(image.data.len(), pixels * RASTER_QUALITY as usize / 100);
                }
                other => panic!("expected raster page, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_render_failure_aborts_candidate() {
        let document = mixed_document().failing_above_zoom(1.0);
        let engine = MemoryEngine::new(document.clone());
        let result = DocumentRebuilder::new(PixelCountCodec).rebuild(
            &engine,
            &document,
            &Candidate::full_rerender(150, 1.0),
        );
        assert!(matches!(
            result,
            Err(CandidateError::Engine(EngineError::Render { .. }))
        ));
    }

    #[test]
    fn test_size_shrinks_with_scale() {
        let document = mixed_document();
        let engine = MemoryEngine::new(document.clone());
        let rebuilder = DocumentRebuilder::new(PixelCountCodec);

        let sizes: Vec<usize> = [1.0, 0.8, 0.6, 0.4]
            .iter()
            .map(|&scale| {
                let mut out = Vec::new();
                rebuilder
                    .rebuild_to(&engine, &document, &Candidate::image_recompress(85, scale), &mut out)
                    .unwrap();
                out.len()
            })
            .collect();

        assert!(sizes.windows(2).all(|w| w[1] <= w[0]), "sizes: {:?}", sizes);
    }

    #[test]
    fn test_source_is_left_untouched() {
        let document = mixed_document();
        let before = document.clone();
        rebuild(&document, Candidate::full_rerender(60, 0.4));
        assert_eq!(document, before);
    }
}
