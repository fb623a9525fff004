//! Capabilities the compressor needs from a PDF engine and an image codec
//!
//! The search and rebuild logic only talks to these traits. `lopdf_backend`
//! (with `pdfium` for rendering) is the production engine; `memory` is a
//! small in-memory engine for deterministic tests.

pub mod codec;
pub mod lopdf_backend;
pub mod memory;
pub mod pdfium;

use std::io::Write;
use std::path::Path;

use image::DynamicImage;

use crate::error::EngineError;
use crate::model::PageSize;

pub use codec::{ImageCodec, JpegCodec};
pub use lopdf_backend::{LopdfBuilder, LopdfDocument, LopdfEngine};
pub use memory::{MemoryDocument, MemoryEngine, MemoryPage};
pub use pdfium::PdfiumRasterizer;

/// An image XObject as stored in the source document
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    /// Length of the encoded stream in bytes
    pub encoded_len: usize,
}

/// Encoded JPEG data with its pixel dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Structural cleanup applied when a document is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Drop objects no longer reachable from the trailer
    pub garbage_collect: bool,
    /// Flate-compress streams that carry no filter
    pub deflate: bool,
    /// Remove empty streams and renumber objects densely
    pub clean: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            garbage_collect: true,
            deflate: true,
            clean: true,
        }
    }
}

/// A document opened read-only
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    /// Displayed size: the visible box, with width and height swapped for
    /// quarter-turn rotations
    fn page_size(&self, index: usize) -> Result<PageSize, EngineError>;

    /// Images drawn by the page, including those inside form XObjects
    fn images(&self, index: usize) -> Result<Vec<EmbeddedImage>, EngineError>;

    fn image_count(&self, index: usize) -> Result<usize, EngineError> {
        Ok(self.images(index)?.len())
    }

    /// Render the page at `zoom` pixels per point
    fn render_page(&self, index: usize, zoom: f32) -> Result<DynamicImage, EngineError>;
}

/// A new document assembled page by page
pub trait DocumentBuilder {
    type Source: SourceDocument;

    /// Append a page of `size` covered by a single JPEG
    fn add_image_page(&mut self, size: PageSize, image: &RasterImage) -> Result<(), EngineError>;

    /// Append a page of `size` that draws the source page's content, scaled
    /// uniformly to fit
    fn add_source_page(
        &mut self,
        size: PageSize,
        source: &Self::Source,
        index: usize,
    ) -> Result<(), EngineError>;

    fn page_count(&self) -> usize;

    fn save_to<W: Write>(self, writer: &mut W, options: &SaveOptions) -> Result<(), EngineError>;
}

pub trait PdfEngine {
    type Document: SourceDocument;
    type Builder: DocumentBuilder<Source = Self::Document>;

    fn open(&self, path: &Path) -> Result<Self::Document, EngineError>;

    fn new_document(&self) -> Self::Builder;
}

/// Turns serialized PDFs into pixels
pub trait Rasterize {
    /// Parse `pdf` once so its pages can be rendered repeatedly
    fn load(&self, pdf: Vec<u8>) -> Result<Box<dyn PageRenderer>, EngineError>;
}

/// A document loaded by a [`Rasterize`] implementation
pub trait PageRenderer {
    /// Render the page as displayed (CropBox and /Rotate applied) at `zoom`
    /// pixels per point
    fn render_page(&self, index: usize, zoom: f32) -> Result<DynamicImage, EngineError>;
}
