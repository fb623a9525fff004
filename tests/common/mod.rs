//! PDF fixtures built with lopdf, plus a rasterizer that needs no PDFium

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use pdf_compress::engine::{
    ImageCodec, JpegCodec, LopdfDocument, PageRenderer, Rasterize, SourceDocument,
};
use pdf_compress::EngineError;

pub const LETTER: (i64, i64) = (612, 792);

/// Renders every page as plain white at the requested zoom
pub struct FlatRasterizer {
    loads: Arc<AtomicUsize>,
}

impl FlatRasterizer {
    pub fn new() -> Self {
        Self {
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of documents loaded through this rasterizer
    pub fn loads(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.loads)
    }
}

impl Rasterize for FlatRasterizer {
    fn load(&self, pdf: Vec<u8>) -> Result<Box<dyn PageRenderer>, EngineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FlatPages(LopdfDocument::from_bytes(pdf)?)))
    }
}

struct FlatPages(LopdfDocument);

impl PageRenderer for FlatPages {
    fn render_page(&self, index: usize, zoom: f32) -> Result<DynamicImage, EngineError> {
        let (width, height) = self.0.page_size(index)?.pixels_at(zoom);
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([255, 255, 255]),
        )))
    }
}

/// Pseudo-random pixels, which JPEG cannot shrink much
pub fn noise(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x1234_5678;
    RgbImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let [r, g, b, _] = state.to_be_bytes();
        Rgb([r, g, b])
    })
}

fn finish(mut doc: Document, pages_id: lopdf::ObjectId, kids: Vec<Object>, path: &Path) {
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize fixture");
    fs::write(path, bytes).expect("Failed to write fixture");
}

/// Letter-sized pages of Helvetica text and nothing else
pub fn write_text_pdf(path: &Path, pages: usize) {
    write_pages(path, pages, |_| Vec::new(), true);
}

/// One letter page of text shown through `crop` and turned by `rotate`
pub fn write_rotated_pdf(path: &Path, crop: [i64; 4], rotate: i64) {
    let crop_box: Vec<Object> = crop.iter().map(|&v| v.into()).collect();
    write_pages(
        path,
        1,
        |_| vec![("CropBox", Object::Array(crop_box.clone())), ("Rotate", rotate.into())],
        true,
    );
}

/// Letter pages with an empty content stream
pub fn write_blank_pdf(path: &Path, pages: usize) {
    write_pages(path, pages, |_| Vec::new(), false);
}

fn write_pages(
    path: &Path,
    pages: usize,
    extra: impl Fn(usize) -> Vec<(&'static str, Object)>,
    with_text: bool,
) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for page in 0..pages {
        let operations = if with_text {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Hello from page {}", page + 1))],
                ),
                Operation::new("ET", vec![]),
            ]
        } else {
            Vec::new()
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            Content { operations }
                .encode()
                .expect("Failed to encode content"),
        ));
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), LETTER.0.into(), LETTER.1.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        };
        for (key, value) in extra(page) {
            page_dict.set(key, value);
        }
        let page_id = doc.add_object(page_dict);
        kids.push(page_id.into());
    }
    finish(doc, pages_id, kids, path);
}

/// One letter page covered by a noisy JPEG of `width` x `height` pixels
pub fn write_image_pdf(path: &Path, width: u32, height: u32) {
    let jpeg = JpegCodec::default()
        .encode(&noise(width, height), 90)
        .expect("Failed to encode fixture image");

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false),
    );
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    LETTER.0.into(),
                    0.into(),
                    0.into(),
                    LETTER.1.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("Failed to encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), LETTER.0.into(), LETTER.1.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        },
    });
    finish(doc, pages_id, vec![page_id.into()], path);
}

/// Decoded content of a stream object, whatever its filter
pub fn stream_content(doc: &Document, object: &Object) -> Vec<u8> {
    let id = object.as_reference().expect("Expected a reference");
    let stream = doc
        .get_object(id)
        .and_then(Object::as_stream)
        .expect("Expected a stream");
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}
