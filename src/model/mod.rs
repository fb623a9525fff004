pub mod analysis;
pub mod candidate;
pub mod geometry;
pub mod report;

pub use analysis::{DocumentAnalysis, Strategy};
pub use candidate::{Candidate, RebuildMode};
pub use geometry::PageSize;
pub use report::{format_file_size, Attempt, AttemptOutcome, CompressionReport};
