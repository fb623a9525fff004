//! Size-targeting search
//!
//! Candidates are tried in a fixed order and the first one whose serialized
//! size meets the target wins. Phase 1 recompresses image pages across the
//! quality × scale grid; only if nothing fits does phase 2 re-render every
//! page across the DPI × scale grid.

pub mod selection;

use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use crate::cli::default_output_path;
use crate::config::SearchSettings;
use crate::engine::{ImageCodec, JpegCodec, PdfEngine};
use crate::error::{CandidateError, CompressError};
use crate::model::{format_file_size, Attempt, AttemptOutcome, Candidate, CompressionReport};
use crate::render::DocumentRebuilder;

pub use selection::{Artifact, Selected, Selection};

const TEMP_PREFIX: &str = ".pdf-compress-";
const TEMP_SUFFIX: &str = ".tmp";

pub struct SizeTargetSearch<E, C = JpegCodec> {
    engine: E,
    rebuilder: DocumentRebuilder<C>,
    settings: SearchSettings,
}

impl<E: PdfEngine> SizeTargetSearch<E, JpegCodec> {
    pub fn new(engine: E, settings: SearchSettings) -> Self {
        Self::with_codec(engine, JpegCodec::default(), settings)
    }
}

impl<E: PdfEngine, C: ImageCodec> SizeTargetSearch<E, C> {
    pub fn with_codec(engine: E, codec: C, settings: SearchSettings) -> Self {
        Self {
            engine,
            rebuilder: DocumentRebuilder::new(codec),
            settings,
        }
    }

    /// Compress `input` to at most the target size.
    ///
    /// Writes `output` (default `<stem>_compressed<ext>` beside the input)
    /// only on success. Inputs already within the target are copied as is.
    pub fn compress(
        &self,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<CompressionReport, CompressError> {
        if !input.is_file() {
            return Err(CompressError::InputNotFound(input.to_path_buf()));
        }
        self.settings.validate()?;

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(input));
        let target = self.settings.target_size_bytes;
        let original_size = fs::metadata(input)?.len();

        log::info!("Original size: {}", format_file_size(original_size));
        log::info!("Target size: {}", format_file_size(target));

        if original_size <= target {
            log::info!("File already meets the target size, copying");
            if !is_same_file(input, &output) {
                fs::copy(input, &output)?;
            }
            return Ok(CompressionReport {
                output,
                original_size,
                final_size: original_size,
                target_size: target,
                selected: None,
                attempts: Vec::new(),
            });
        }

        let work_dir = parent_dir(&output);
        if !work_dir.is_dir() {
            return Err(CompressError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Output directory not found: {}", work_dir.display()),
            )));
        }

        let source = match self.engine.open(input) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Could not open {}: {}", input.display(), e);
                return Err(CompressError::TargetUnreachable { target });
            }
        };

        let mut selection = Selection::new(target);
        let mut attempts = Vec::new();

        log::info!("Phase 1: image recompression");
        let image_levels: Vec<Vec<Candidate>> = self
            .settings
            .quality_levels
            .iter()
            .map(|&quality| self.scaled(|scale| Candidate::image_recompress(quality, scale)))
            .collect();
        self.run_phase(&source, &work_dir, &image_levels, &mut selection, &mut attempts);

        if !selection.is_found() {
            log::info!("Phase 2: full page re-render");
            let dpi_levels: Vec<Vec<Candidate>> = self
                .settings
                .dpi_levels
                .iter()
                .map(|&dpi| self.scaled(|scale| Candidate::full_rerender(dpi, scale)))
                .collect();
            self.run_phase(&source, &work_dir, &dpi_levels, &mut selection, &mut attempts);
        }

        let Some(selected) = selection.into_selected() else {
            log::warn!(
                "No candidate reached {} after {} attempts",
                format_file_size(target),
                attempts.len()
            );
            return Err(CompressError::TargetUnreachable { target });
        };

        let final_size = selected.artifact.size;
        selected.artifact.persist(&output)?;
        log::info!("Selected {} ({})", selected.candidate, format_file_size(final_size));

        Ok(CompressionReport {
            output,
            original_size,
            final_size,
            target_size: target,
            selected: Some(selected.candidate),
            attempts,
        })
    }

    /// One candidate per scale factor, in order
    fn scaled(&self, make: impl Fn(f32) -> Candidate) -> Vec<Candidate> {
        self.settings.scale_factors.iter().map(|&s| make(s)).collect()
    }

    /// Walk `levels` in order, stopping at the first level that produces a
    /// candidate within the target
    fn run_phase(
        &self,
        source: &E::Document,
        work_dir: &Path,
        levels: &[Vec<Candidate>],
        selection: &mut Selection,
        attempts: &mut Vec<Attempt>,
    ) {
        for level in levels {
            for candidate in level {
                match self.evaluate(source, work_dir, candidate) {
                    Ok(artifact) => {
                        let size = artifact.size;
                        log::info!("  {}: {}", candidate, format_file_size(size));
                        attempts.push(Attempt {
                            candidate: *candidate,
                            outcome: AttemptOutcome::Measured(size),
                        });
                        if size <= selection.target() {
                            selection.offer(*candidate, artifact);
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("  {}: failed: {}", candidate, e);
                        attempts.push(Attempt {
                            candidate: *candidate,
                            outcome: AttemptOutcome::Failed(e.to_string()),
                        });
                    }
                }
            }
            if selection.is_found() {
                break;
            }
        }
    }

    /// Build and serialize one candidate into a temporary file in `work_dir`
    fn evaluate(
        &self,
        source: &E::Document,
        work_dir: &Path,
        candidate: &Candidate,
    ) -> Result<Artifact, CandidateError> {
        let file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(work_dir)?;
        let mut writer = BufWriter::new(file);
        self.rebuilder
            .rebuild_to(&self.engine, source, candidate, &mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(Artifact::new(file)?)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
