//! PDF engine backed by lopdf
//!
//! lopdf handles the object graph: page geometry, image enumeration, page
//! transclusion through form XObjects and cleanup on save. Pixels come from
//! an optional [`Rasterize`] implementation, usually PDFium.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::{
    DocumentBuilder, EmbeddedImage, PageRenderer, PdfEngine, RasterImage, Rasterize, SaveOptions,
    SourceDocument,
};
use crate::error::EngineError;
use crate::model::PageSize;

/// Page tree inheritance is never this deep in sane files
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Resource name of the raster image on a rasterized page
const RASTER_NAME: &str = "Im0";

/// Resource name of the transcluded source page
const FORM_NAME: &str = "Fm0";

#[derive(Clone, Default)]
pub struct LopdfEngine {
    rasterizer: Option<Arc<dyn Rasterize>>,
}

impl LopdfEngine {
    /// Engine without rendering; pages can be inspected and transcluded only
    pub fn new() -> Self {
        Self { rasterizer: None }
    }

    pub fn with_rasterizer(rasterizer: impl Rasterize + 'static) -> Self {
        Self {
            rasterizer: Some(Arc::new(rasterizer)),
        }
    }
}

impl PdfEngine for LopdfEngine {
    type Document = LopdfDocument;
    type Builder = LopdfBuilder;

    fn open(&self, path: &Path) -> Result<LopdfDocument, EngineError> {
        let bytes = fs::read(path)?;
        let mut document = LopdfDocument::from_bytes(bytes)?;
        document.rasterizer = self.rasterizer.clone();
        Ok(document)
    }

    fn new_document(&self) -> LopdfBuilder {
        LopdfBuilder::new()
    }
}

/// A loaded source PDF; the original bytes are kept for the rasterizer
pub struct LopdfDocument {
    document: Document,
    bytes: Vec<u8>,
    page_ids: Vec<ObjectId>,
    rasterizer: Option<Arc<dyn Rasterize>>,
    /// Loaded on first render and reused for every later page and candidate
    renderer: OnceCell<Box<dyn PageRenderer>>,
}

impl LopdfDocument {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, EngineError> {
        let document = Document::load_mem(&bytes)?;
        let page_ids = document.get_pages().into_values().collect();
        Ok(Self {
            document,
            bytes,
            page_ids,
            rasterizer: None,
            renderer: OnceCell::new(),
        })
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, EngineError> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(EngineError::PageOutOfRange {
                index,
                count: self.page_ids.len(),
            })
    }

    /// Look up a page attribute, following /Parent for inheritable keys
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.document.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(self.resolve(value));
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.document.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            _ => object,
        }
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(object).as_dict().ok()
    }

    /// Inherited rectangle `key` as (x0, y0, x1, y1), normalized so
    /// x0 < x1 and y0 < y1
    fn rectangle(&self, index: usize, key: &[u8]) -> Result<Option<[f32; 4]>, EngineError> {
        let page_id = self.page_id(index)?;
        let Some(object) = self.inherited(page_id, key) else {
            return Ok(None);
        };
        let malformed = |message: &str| EngineError::MalformedPage {
            page: index,
            message: format!("{} {}", String::from_utf8_lossy(key), message),
        };

        let values = object.as_array().map_err(|_| malformed("is not an array"))?;
        if values.len() != 4 {
            return Err(malformed("must have four numbers"));
        }

        let mut numbers = [0.0f32; 4];
        for (slot, value) in numbers.iter_mut().zip(values) {
            *slot = number(self.resolve(value)).ok_or_else(|| malformed("is not numeric"))?;
        }
        let [a, b, c, d] = numbers;
        Ok(Some([a.min(c), b.min(d), a.max(c), b.max(d)]))
    }

    /// Visible region: the CropBox clipped to the MediaBox, or the MediaBox
    fn page_box(&self, index: usize) -> Result<[f32; 4], EngineError> {
        let media = self
            .rectangle(index, b"MediaBox")?
            .ok_or_else(|| EngineError::MalformedPage {
                page: index,
                message: "missing MediaBox".to_string(),
            })?;
        let Some(crop) = self.rectangle(index, b"CropBox")? else {
            return Ok(media);
        };

        let clipped = [
            crop[0].max(media[0]),
            crop[1].max(media[1]),
            crop[2].min(media[2]),
            crop[3].min(media[3]),
        ];
        if clipped[0] < clipped[2] && clipped[1] < clipped[3] {
            Ok(clipped)
        } else {
            log::warn!("Page {} CropBox lies outside its MediaBox, ignoring it", index);
            Ok(media)
        }
    }

    /// Clockwise display rotation in degrees: 0, 90, 180 or 270
    fn rotation(&self, index: usize) -> Result<i64, EngineError> {
        let page_id = self.page_id(index)?;
        let degrees = self
            .inherited(page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0)
            .rem_euclid(360);
        if degrees % 90 != 0 {
            log::warn!("Page {} has /Rotate {}, ignoring it", index, degrees);
            return Ok(0);
        }
        Ok(degrees)
    }

    fn renderer(&self) -> Result<&dyn PageRenderer, EngineError> {
        if let Some(renderer) = self.renderer.get() {
            return Ok(&**renderer);
        }
        let rasterizer = self.rasterizer.as_ref().ok_or_else(|| {
            EngineError::RendererUnavailable("engine was created without a rasterizer".to_string())
        })?;
        let loaded = rasterizer.load(self.bytes.clone())?;
        Ok(&**self.renderer.get_or_init(|| loaded))
    }

    fn collect_images(
        &self,
        resources: &Dictionary,
        images: &mut Vec<EmbeddedImage>,
        seen: &mut HashSet<ObjectId>,
    ) {
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| self.resolve_dict(obj))
        else {
            return;
        };

        for (_, value) in xobjects.iter() {
            let Ok(id) = value.as_reference() else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            let Ok(Object::Stream(stream)) = self.document.get_object(id) else {
                continue;
            };

            match stream.dict.get(b"Subtype") {
                Ok(Object::Name(name)) if name.as_slice() == b"Image" => {
                    let dimension = |key: &[u8]| {
                        stream
                            .dict
                            .get(key)
                            .ok()
                            .and_then(|obj| obj.as_i64().ok())
                            .map(|v| v.max(0) as u32)
                            .unwrap_or(0)
                    };
                    images.push(EmbeddedImage {
                        width: dimension(b"Width"),
                        height: dimension(b"Height"),
                        encoded_len: stream.content.len(),
                    });
                }
                Ok(Object::Name(name)) if name.as_slice() == b"Form" => {
                    if let Some(form_resources) = stream
                        .dict
                        .get(b"Resources")
                        .ok()
                        .and_then(|obj| self.resolve_dict(obj))
                    {
                        self.collect_images(form_resources, images, seen);
                    }
                }
                _ => {}
            }
        }
    }
}

impl SourceDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_size(&self, index: usize) -> Result<PageSize, EngineError> {
        let [x0, y0, x1, y1] = self.page_box(index)?;
        let (width, height) = (x1 - x0, y1 - y0);
        match self.rotation(index)? {
            90 | 270 => Ok(PageSize::new(height, width)),
            _ => Ok(PageSize::new(width, height)),
        }
    }

    fn images(&self, index: usize) -> Result<Vec<EmbeddedImage>, EngineError> {
        let page_id = self.page_id(index)?;
        let mut images = Vec::new();
        if let Some(resources) = self
            .inherited(page_id, b"Resources")
            .and_then(|obj| obj.as_dict().ok())
        {
            self.collect_images(resources, &mut images, &mut HashSet::new());
        }
        Ok(images)
    }

    fn render_page(&self, index: usize, zoom: f32) -> Result<DynamicImage, EngineError> {
        self.page_id(index)?;
        self.renderer()?.render_page(index, zoom)
    }
}

/// New document under construction
pub struct LopdfBuilder {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    /// Source object id to copied object id
    imported: BTreeMap<ObjectId, ObjectId>,
}

impl LopdfBuilder {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
            imported: BTreeMap::new(),
        }
    }

    fn push_page(
        &mut self,
        size: PageSize,
        operations: Vec<Operation>,
        resources: Dictionary,
    ) -> Result<(), EngineError> {
        let content = Content { operations }.encode()?;
        let content_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), content));
        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => Object::Array(vec![0.into(), 0.into(), size.width.into(), size.height.into()]),
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id);
        Ok(())
    }

    /// Deep-copy an object from `source`, remapping every reference
    fn import(&mut self, source: &Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => Object::Reference(self.import_reference(source, *id)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.import(source, item)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.import_dictionary(source, dict)),
            Object::Stream(stream) => {
                let dict = self.import_dictionary(source, &stream.dict);
                let copy = Stream::new(dict, stream.content.clone())
                    .with_compression(stream.allows_compression);
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn import_reference(&mut self, source: &Document, id: ObjectId) -> ObjectId {
        if let Some(&mapped) = self.imported.get(&id) {
            return mapped;
        }
        let new_id = self.document.new_object_id();
        self.imported.insert(id, new_id);
        let copied = match source.get_object(id) {
            Ok(object) => self.import(source, object),
            Err(_) => Object::Null,
        };
        self.document.objects.insert(new_id, copied);
        new_id
    }

    fn import_dictionary(&mut self, source: &Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            // Pulling /Parent would drag the whole source page tree along
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.import(source, value));
        }
        copy
    }
}

impl Default for LopdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder for LopdfBuilder {
    type Source = LopdfDocument;

    fn add_image_page(&mut self, size: PageSize, image: &RasterImage) -> Result<(), EngineError> {
        let image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        let image_id = self
            .document
            .add_object(Stream::new(image_dict, image.data.clone()).with_compression(false));

        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    size.width.into(),
                    0.into(),
                    0.into(),
                    size.height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(RASTER_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ];
        let resources = dictionary! {
            "XObject" => dictionary! { RASTER_NAME => image_id },
        };
        self.push_page(size, operations, resources)
    }

    fn add_source_page(
        &mut self,
        size: PageSize,
        source: &LopdfDocument,
        index: usize,
    ) -> Result<(), EngineError> {
        let page_id = source.page_id(index)?;
        let bbox = source.page_box(index)?;
        let rotation = source.rotation(index)?;
        let content = source.document.get_page_content(page_id)?;

        let [x0, y0, x1, y1] = bbox;
        if x1 - x0 <= 0.0 || y1 - y0 <= 0.0 {
            return Err(EngineError::MalformedPage {
                page: index,
                message: "empty page box".to_string(),
            });
        }

        // An empty form stream is dropped on save, which would leave a
        // dangling Do
        if content.iter().all(u8::is_ascii_whitespace) {
            log::debug!("Page {} has no content, adding a blank page", index);
            return self.push_page(size, Vec::new(), Dictionary::new());
        }

        let mut form_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1,
            "BBox" => Object::Array(vec![x0.into(), y0.into(), x1.into(), y1.into()]),
        };
        if let Some(resources) = source.inherited(page_id, b"Resources") {
            let imported = self.import(&source.document, resources);
            form_dict.set("Resources", imported);
        }
        let form_id = self.document.add_object(Stream::new(form_dict, content));

        log::debug!(
            "Transcluding page {} ({}x{} pt, rotated {}) into {}x{} pt",
            index,
            x1 - x0,
            y1 - y0,
            rotation,
            size.width,
            size.height
        );

        let matrix: Vec<Object> = placement(bbox, rotation, size)
            .into_iter()
            .map(Object::from)
            .collect();
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("cm", matrix),
            Operation::new("Do", vec![Object::Name(FORM_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ];
        let resources = dictionary! {
            "XObject" => dictionary! { FORM_NAME => form_id },
        };
        self.push_page(size, operations, resources)
    }

    fn page_count(&self) -> usize {
        self.kids.len()
    }

    fn save_to<W: Write>(self, writer: &mut W, options: &SaveOptions) -> Result<(), EngineError> {
        let LopdfBuilder {
            mut document,
            pages_id,
            kids,
            ..
        } = self;

        let count = kids.len() as i64;
        let kids: Vec<Object> = kids.into_iter().map(Object::Reference).collect();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        save_document(&mut document, writer, options)
    }
}

/// Apply the requested cleanup and serialize
pub fn save_document<W: Write>(
    document: &mut Document,
    writer: &mut W,
    options: &SaveOptions,
) -> Result<(), EngineError> {
    if options.garbage_collect {
        document.prune_objects();
    }
    if options.clean {
        document.delete_zero_length_streams();
        document.renumber_objects();
    }
    if options.deflate {
        document.compress();
    }
    document.save_to(writer)?;
    Ok(())
}

/// Matrix that draws the `bbox` region, turned clockwise by `rotation`
/// degrees, onto a page of `size` with its corner at the origin
fn placement(bbox: [f32; 4], rotation: i64, size: PageSize) -> [f32; 6] {
    let [x0, y0, x1, y1] = bbox;
    let (width, height) = (x1 - x0, y1 - y0);
    let (sx, sy) = match rotation {
        90 | 270 => (size.height / width, size.width / height),
        _ => (size.width / width, size.height / height),
    };
    match rotation {
        90 => [0.0, -sx, sy, 0.0, -sy * y0, sx * x1],
        180 => [-sx, 0.0, 0.0, -sy, sx * x1, sy * y1],
        270 => [0.0, sx, -sy, 0.0, sy * y1, -sx * x0],
        _ => [sx, 0.0, 0.0, sy, -sx * x0, -sy * y0],
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
