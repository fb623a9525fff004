/// JPEG quality levels tried in the image-recompress phase, best first
pub const QUALITY_LEVELS: [u8; 8] = [95, 85, 75, 65, 50, 40, 30, 20];

/// Page scale factors tried for every quality or DPI level, largest first
pub const SCALE_FACTORS: [f32; 7] = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4];

/// Render resolutions tried in the full re-render phase, highest first
pub const DPI_LEVELS: [u32; 6] = [150, 120, 100, 80, 60, 50];

/// Default target size in megabytes
pub const DEFAULT_TARGET_SIZE_MB: f64 = 1.0;

/// PDF user space resolution (points per inch)
pub const BASE_DPI: f32 = 72.0;

/// JPEG quality used when a whole page is re-rendered at a given DPI
pub const RASTER_QUALITY: u8 = 85;

/// Physical size assumed for an image's longest side when estimating DPI
pub const ASSUMED_IMAGE_INCHES: f64 = 8.5;

/// Image area / page area above which a document counts as image heavy
pub const IMAGE_HEAVY_RATIO: f64 = 0.30;

/// Image area / page area below which a document counts as text heavy
pub const TEXT_HEAVY_RATIO: f64 = 0.10;

/// Average DPI above which image-heavy documents get aggressive treatment
pub const HIGH_DPI_THRESHOLD: f64 = 200.0;

/// Bounds for the optimal DPI estimate
pub const MIN_OPTIMAL_DPI: u32 = 50;
pub const MAX_OPTIMAL_DPI: u32 = 300;

/// Bytes per megabyte for target size conversion
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
