pub mod analyze;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod optimize;
pub mod render;
pub mod search;

use std::path::Path;

pub use analyze::{analyze, analyze_file, recommend};
pub use config::SearchSettings;
pub use engine::{LopdfEngine, PdfiumRasterizer};
pub use error::{CandidateError, CodecError, CompressError, ConfigError, EngineError};
pub use model::{Candidate, CompressionReport, DocumentAnalysis, RebuildMode, Strategy};
pub use search::SizeTargetSearch;

/// The production engine: lopdf for structure, PDFium for rendering.
///
/// If libpdfium cannot be loaded the engine still opens and transcludes
/// pages, but every candidate that needs a raster fails.
pub fn default_engine() -> LopdfEngine {
    match PdfiumRasterizer::bind() {
        Ok(rasterizer) => LopdfEngine::with_rasterizer(rasterizer),
        Err(e) => {
            log::warn!("{}; pages cannot be rasterized", e);
            LopdfEngine::new()
        }
    }
}

/// High-level API for shrinking a PDF to a target size.
///
/// This is the recommended entry point for library consumers. It runs the
/// full quality/scale/DPI search with the default grids and the production
/// engine.
///
/// # Arguments
///
/// * `input` - Path of the PDF to compress
/// * `output` - Where to write the result; `None` writes
///   `<stem>_compressed.pdf` beside the input
/// * `target_mb` - Size budget in megabytes (1 MB = 1024 * 1024 bytes)
///
/// # Returns
///
/// A report with the original and final sizes and the settings that were
/// selected, or a CompressError if no setting reached the target.
///
/// # Example
///
/// ```no_run
/// use pdf_compress::compress_file;
/// use std::path::Path;
///
/// let report = compress_file(Path::new("scan.pdf"), None, 2.0).unwrap();
///
/// println!(
///     "{} -> {} bytes ({:.1}% smaller)",
///     report.original_size,
///     report.final_size,
///     report.reduction_percent()
/// );
/// ```
pub fn compress_file(
    input: &Path,
    output: Option<&Path>,
    target_mb: f64,
) -> Result<CompressionReport, CompressError> {
    let settings = SearchSettings::default().with_target_mb(target_mb)?;
    SizeTargetSearch::new(default_engine(), settings).compress(input, output)
}
