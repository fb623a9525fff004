//! One-shot document cleanups outside the size search

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::{Document, Object};

use crate::config::defaults::{MAX_OPTIMAL_DPI, MIN_OPTIMAL_DPI};
use crate::engine::lopdf_backend::save_document;
use crate::engine::{ImageCodec, PdfEngine, SaveOptions};
use crate::error::{CandidateError, EngineError};
use crate::model::Candidate;
use crate::render::DocumentRebuilder;
use crate::search::Artifact;

/// Drop the document info dictionary and the catalog's XMP metadata stream
pub fn strip_metadata(input: &Path, output: &Path) -> Result<(), EngineError> {
    let mut document = Document::load(input)?;
    document.trailer.remove(b"Info");

    let root = document.trailer.get(b"Root").and_then(Object::as_reference)?;
    if document.get_dictionary_mut(root)?.remove(b"Metadata").is_some() {
        log::debug!("Removed XMP metadata stream");
    }

    write_cleaned(&mut document, output)
}

/// Remove /Annots from every page. Returns the number of pages changed.
pub fn strip_annotations(input: &Path, output: &Path) -> Result<usize, EngineError> {
    let mut document = Document::load(input)?;
    let mut stripped = 0;

    for page_id in document.get_pages().into_values() {
        if document.get_dictionary_mut(page_id)?.remove(b"Annots").is_some() {
            stripped += 1;
        }
    }
    log::info!("Removed annotations from {} pages", stripped);

    write_cleaned(&mut document, output)?;
    Ok(stripped)
}

fn write_cleaned(document: &mut Document, output: &Path) -> Result<(), EngineError> {
    let mut writer = BufWriter::new(File::create(output)?);
    save_document(document, &mut writer, &SaveOptions::default())?;
    writer.flush()?;
    Ok(())
}

/// Re-render every page at `dpi` and write the result to `output`.
///
/// Returns the output size. Nothing is written if any page fails.
pub fn flatten<E: PdfEngine, C: ImageCodec>(
    engine: &E,
    rebuilder: &DocumentRebuilder<C>,
    input: &Path,
    output: &Path,
    dpi: u32,
) -> Result<u64, CandidateError> {
    let source = engine.open(input)?;
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut writer = BufWriter::new(tempfile::NamedTempFile::new_in(dir)?);
    rebuilder.rebuild_to(engine, &source, &Candidate::full_rerender(dpi, 1.0), &mut writer)?;
    let artifact = Artifact::new(writer.into_inner().map_err(|e| e.into_error())?)?;

    let size = artifact.size;
    artifact.persist(output)?;
    log::info!("Flattened {} at {} DPI", input.display(), dpi);
    Ok(size)
}

/// Resolution that should bring a document from `original_size` to roughly
/// `target_size`, given that size grows with the square of DPI
pub fn optimal_dpi(original_size: u64, target_size: u64, current_dpi: u32) -> u32 {
    if original_size == 0 {
        return current_dpi.clamp(MIN_OPTIMAL_DPI, MAX_OPTIMAL_DPI);
    }
    let ratio = target_size as f64 / original_size as f64;
    let dpi = (current_dpi as f64 * ratio.sqrt()) as u32;
    dpi.clamp(MIN_OPTIMAL_DPI, MAX_OPTIMAL_DPI)
}
