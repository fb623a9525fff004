//! In-memory engine
//!
//! Pages are plain descriptions and a saved document is just the page
//! payloads written back to back, so output size follows directly from what
//! the rebuilder put in. Useful for exercising the search without PDFium.

use std::io::{self, Read, Write};
use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};

use super::{DocumentBuilder, EmbeddedImage, PdfEngine, RasterImage, SaveOptions, SourceDocument};
use crate::error::EngineError;
use crate::model::PageSize;

const HEADER: &[u8] = b"%MEM-PDF\n";

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPage {
    pub size: PageSize,
    pub images: Vec<EmbeddedImage>,
    /// Bytes of vector/text content carried over when the page is copied
    pub content_len: usize,
}

impl MemoryPage {
    pub fn text(size: PageSize, content_len: usize) -> Self {
        Self {
            size,
            images: Vec::new(),
            content_len,
        }
    }

    pub fn with_image(size: PageSize, image: EmbeddedImage, content_len: usize) -> Self {
        Self {
            size,
            images: vec![image],
            content_len,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDocument {
    pub pages: Vec<MemoryPage>,
    /// Rendering above this zoom fails, to simulate engine errors
    pub max_render_zoom: Option<f32>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<MemoryPage>) -> Self {
        Self {
            pages,
            max_render_zoom: None,
        }
    }

    pub fn failing_above_zoom(mut self, zoom: f32) -> Self {
        self.max_render_zoom = Some(zoom);
        self
    }

    fn page(&self, index: usize) -> Result<&MemoryPage, EngineError> {
        self.pages.get(index).ok_or(EngineError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }
}

impl SourceDocument for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<PageSize, EngineError> {
        Ok(self.page(index)?.size)
    }

    fn images(&self, index: usize) -> Result<Vec<EmbeddedImage>, EngineError> {
        Ok(self.page(index)?.images.clone())
    }

    fn render_page(&self, index: usize, zoom: f32) -> Result<DynamicImage, EngineError> {
        let page = self.page(index)?;
        if let Some(max) = self.max_render_zoom {
            if zoom > max {
                return Err(EngineError::Render {
                    page: index,
                    message: format!("zoom {:.3} exceeds {:.3}", zoom, max),
                });
            }
        }
        let (width, height) = page.size.pixels_at(zoom);
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([200, 200, 200]),
        )))
    }
}

/// A page of a document built by [`MemoryBuilder`]
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltPage {
    Raster { size: PageSize, image: RasterImage },
    Copied { size: PageSize, source_index: usize, content_len: usize },
}

impl BuiltPage {
    pub fn size(&self) -> PageSize {
        match self {
            BuiltPage::Raster { size, .. } | BuiltPage::Copied { size, .. } => *size,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBuilder {
    pages: Vec<BuiltPage>,
}

impl MemoryBuilder {
    pub fn pages(&self) -> &[BuiltPage] {
        &self.pages
    }
}

impl DocumentBuilder for MemoryBuilder {
    type Source = MemoryDocument;

    fn add_image_page(&mut self, size: PageSize, image: &RasterImage) -> Result<(), EngineError> {
        self.pages.push(BuiltPage::Raster {
            size,
            image: image.clone(),
        });
        Ok(())
    }

    fn add_source_page(
        &mut self,
        size: PageSize,
        source: &MemoryDocument,
        index: usize,
    ) -> Result<(), EngineError> {
        let page = source.page(index)?;
        self.pages.push(BuiltPage::Copied {
            size,
            source_index: index,
            content_len: page.content_len,
        });
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save_to<W: Write>(self, writer: &mut W, _options: &SaveOptions) -> Result<(), EngineError> {
        writer.write_all(HEADER)?;
        for page in &self.pages {
            match page {
                BuiltPage::Raster { image, .. } => writer.write_all(&image.data)?,
                BuiltPage::Copied { content_len, .. } => {
                    io::copy(&mut io::repeat(b'x').take(*content_len as u64), writer)?;
                }
            }
        }
        Ok(())
    }
}

/// Engine that hands out clones of one in-memory document
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    document: MemoryDocument,
}

impl MemoryEngine {
    pub fn new(document: MemoryDocument) -> Self {
        Self { document }
    }
}

impl PdfEngine for MemoryEngine {
    type Document = MemoryDocument;
    type Builder = MemoryBuilder;

    /// The path must exist; its contents are ignored
    fn open(&self, path: &Path) -> Result<MemoryDocument, EngineError> {
        std::fs::metadata(path)?;
        Ok(self.document.clone())
    }

    fn new_document(&self) -> MemoryBuilder {
        MemoryBuilder::default()
    }
}

