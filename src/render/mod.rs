//! Image re-encoding, page rasterization and document rebuilding

pub mod rasterize;
pub mod rebuild;
pub mod recompress;

// Re-export commonly used items for convenience
pub use rasterize::{zoom_for, PageRasterizer, RasterPage};
pub use rebuild::DocumentRebuilder;
pub use recompress::{flatten_to_rgb, ImageRecompressor};
