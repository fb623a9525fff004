use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Could not compress PDF to {target} bytes with the attempted settings. Try a larger target size.")]
    TargetUnreachable { target: u64 },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single (quality, scale) or (dpi, scale) attempt.
#[derive(Error, Debug)]
pub enum CandidateError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Failed to write candidate: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("Malformed page {page}: {message}")]
    MalformedPage { page: usize, message: String },

    #[error("Failed to render page {page}: {message}")]
    Render { page: usize, message: String },

    #[error("No page renderer available: {0}")]
    RendererUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] jpeg_encoder::EncodingError),

    #[error("Image too large for JPEG ({width}x{height}, limit 65535 per side)")]
    TooLarge { width: u32, height: u32 },

    #[error("Scaled image has no pixels ({width}x{height} at scale {scale})")]
    EmptyImage { width: u32, height: u32, scale: f32 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid target size: {0}")]
    InvalidTargetSize(String),

    #[error("Invalid quality level {0} (expected 1-100)")]
    InvalidQuality(u8),

    #[error("Invalid scale factor {0} (expected 0 < scale <= 1)")]
    InvalidScale(f32),

    #[error("Invalid DPI level {0}")]
    InvalidDpi(u32),

    #[error("Empty {0} list")]
    EmptyGrid(&'static str),
}
