use std::fmt;

/// Content profile of a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentAnalysis {
    pub page_count: usize,
    pub image_count: usize,
    /// Encoded size in bytes of every embedded image, in page order
    pub image_sizes: Vec<usize>,
    /// Mean of the per-image DPI estimates, 0 without images
    pub average_dpi: f64,
    pub image_heavy: bool,
    pub text_heavy: bool,
    pub file_size: u64,
}

impl DocumentAnalysis {
    pub fn is_mixed(&self) -> bool {
        !self.image_heavy && !self.text_heavy
    }
}

/// Suggested compression approach for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    AggressiveImageCompression,
    ModerateImageCompression,
    DpiReduction,
    Balanced,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::AggressiveImageCompression => "aggressive_image_compression",
            Strategy::ModerateImageCompression => "moderate_image_compression",
            Strategy::DpiReduction => "dpi_reduction",
            Strategy::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
