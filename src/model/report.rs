use std::path::PathBuf;

use super::candidate::Candidate;

/// Result of evaluating one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Serialized size in bytes
    Measured(u64),
    /// The candidate could not be built
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub candidate: Candidate,
    pub outcome: AttemptOutcome,
}

impl Attempt {
    pub fn size(&self) -> Option<u64> {
        match self.outcome {
            AttemptOutcome::Measured(size) => Some(size),
            AttemptOutcome::Failed(_) => None,
        }
    }
}

/// Outcome of a successful compression run
#[derive(Debug, Clone)]
pub struct CompressionReport {
    pub output: PathBuf,
    pub original_size: u64,
    pub final_size: u64,
    pub target_size: u64,
    /// None when the input already met the target and was copied unchanged
    pub selected: Option<Candidate>,
    /// Every candidate evaluated, in enumeration order
    pub attempts: Vec<Attempt>,
}

impl CompressionReport {
    /// Size reduction as a percentage of the original
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.final_size as f64 / self.original_size as f64) * 100.0
    }
}

/// Format a byte count as B, KB or MB
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes < 1024 {
        format!("{} B", size_bytes)
    } else if size_bytes < 1024 * 1024 {
        format!("{:.1} KB", size_bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size_bytes as f64 / (1024.0 * 1024.0))
    }
}
