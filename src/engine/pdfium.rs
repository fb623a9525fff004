//! Page rendering through PDFium (dynamically linked)

use image::DynamicImage;
use pdfium_render::prelude::*;

use super::{PageRenderer, Rasterize};
use crate::error::EngineError;
use crate::model::PageSize;

pub struct PdfiumRasterizer {
    pdfium: &'static Pdfium,
}

impl PdfiumRasterizer {
    /// Bind to libpdfium.
    ///
    /// Searches the current directory, `vendor/pdfium/lib/`, then the system
    /// library paths. The binding stays loaded for the rest of the process.
    pub fn bind() -> Result<Self, EngineError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "./vendor/pdfium/lib/",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| {
                EngineError::RendererUnavailable(format!("failed to load PDFium library: {:?}", e))
            })?;

        Ok(Self {
            pdfium: Box::leak(Box::new(Pdfium::new(bindings))),
        })
    }
}

impl Rasterize for PdfiumRasterizer {
    fn load(&self, pdf: Vec<u8>) -> Result<Box<dyn PageRenderer>, EngineError> {
        let document = self.pdfium.load_pdf_from_byte_vec(pdf, None).map_err(|e| {
            EngineError::RendererUnavailable(format!("PDFium could not load the document: {}", e))
        })?;
        log::debug!("Loaded {} pages into PDFium", document.pages().len());
        Ok(Box::new(PdfiumDocument { document }))
    }
}

/// A source document parsed once by PDFium
struct PdfiumDocument {
    document: PdfDocument<'static>,
}

impl PageRenderer for PdfiumDocument {
    fn render_page(&self, index: usize, zoom: f32) -> Result<DynamicImage, EngineError> {
        let render_error = |message: String| EngineError::Render {
            page: index,
            message,
        };

        let page_index = u16::try_from(index)
            .map_err(|_| render_error("page index beyond PDFium's range".to_string()))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| render_error(format!("failed to get page: {}", e)))?;

        let (width, height) = PageSize::new(page.width().value, page.height().value).pixels_at(zoom);
        log::debug!("Rendering page {} at {}x{} px (zoom {:.3})", index, width, height, zoom);

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| render_error(format!("failed to render: {}", e)))?;

        Ok(bitmap.as_image())
    }
}
