use std::fmt;

/// How a candidate document is rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildMode {
    /// Rasterize pages that contain images at 72 DPI with the given JPEG
    /// quality; transclude image-free pages unchanged
    ImageRecompress { quality: u8 },
    /// Rasterize every page at the given DPI
    FullRerender { dpi: u32 },
}

/// One point of the search grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub mode: RebuildMode,
    pub scale: f32,
}

impl Candidate {
    pub fn image_recompress(quality: u8, scale: f32) -> Self {
        Self {
            mode: RebuildMode::ImageRecompress { quality },
            scale,
        }
    }

    pub fn full_rerender(dpi: u32, scale: f32) -> Self {
        Self {
            mode: RebuildMode::FullRerender { dpi },
            scale,
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            RebuildMode::ImageRecompress { quality } => {
                write!(f, "Quality {}, Scale {:.1}", quality, self.scale)
            }
            RebuildMode::FullRerender { dpi } => write!(f, "DPI {}, Scale {:.1}", dpi, self.scale),
        }
    }
}
