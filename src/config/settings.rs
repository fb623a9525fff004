use crate::cli::Args;
use crate::error::ConfigError;

use super::defaults::*;

/// Runtime settings for the size-targeting search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Size budget in bytes; a candidate at or below it is accepted
    pub target_size_bytes: u64,

    // Search grids, tried in order
    pub quality_levels: Vec<u8>,
    pub scale_factors: Vec<f32>,
    pub dpi_levels: Vec<u32>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            target_size_bytes: mb_to_bytes(DEFAULT_TARGET_SIZE_MB),
            quality_levels: QUALITY_LEVELS.to_vec(),
            scale_factors: SCALE_FACTORS.to_vec(),
            dpi_levels: DPI_LEVELS.to_vec(),
        }
    }
}

impl SearchSettings {
    /// Create settings from CLI arguments
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let settings = Self::default().with_target_mb(args.size)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Set the target in megabytes (1 MB = 1024 * 1024 bytes)
    pub fn with_target_mb(mut self, megabytes: f64) -> Result<Self, ConfigError> {
        if !megabytes.is_finite() || megabytes <= 0.0 {
            return Err(ConfigError::InvalidTargetSize(megabytes.to_string()));
        }
        self.target_size_bytes = mb_to_bytes(megabytes);
        Ok(self)
    }

    pub fn with_target_bytes(mut self, bytes: u64) -> Self {
        self.target_size_bytes = bytes;
        self
    }

    pub fn with_quality_levels(mut self, levels: impl Into<Vec<u8>>) -> Self {
        self.quality_levels = levels.into();
        self
    }

    pub fn with_scale_factors(mut self, factors: impl Into<Vec<f32>>) -> Self {
        self.scale_factors = factors.into();
        self
    }

    pub fn with_dpi_levels(mut self, levels: impl Into<Vec<u32>>) -> Self {
        self.dpi_levels = levels.into();
        self
    }

    /// Check every grid value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_size_bytes == 0 {
            return Err(ConfigError::InvalidTargetSize("0 bytes".to_string()));
        }
        if self.quality_levels.is_empty() {
            return Err(ConfigError::EmptyGrid("quality"));
        }
        if self.scale_factors.is_empty() {
            return Err(ConfigError::EmptyGrid("scale"));
        }
        if self.dpi_levels.is_empty() {
            return Err(ConfigError::EmptyGrid("DPI"));
        }
        if let Some(&q) = self.quality_levels.iter().find(|&&q| !(1..=100).contains(&q)) {
            return Err(ConfigError::InvalidQuality(q));
        }
        if let Some(&s) = self
            .scale_factors
            .iter()
            .find(|&&s| !(s > 0.0 && s <= 1.0))
        {
            return Err(ConfigError::InvalidScale(s));
        }
        if let Some(&d) = self.dpi_levels.iter().find(|&&d| d == 0) {
            return Err(ConfigError::InvalidDpi(d));
        }
        Ok(())
    }

    /// Worst-case number of rebuilds across both phases
    pub fn max_attempts(&self) -> usize {
        (self.quality_levels.len() + self.dpi_levels.len()) * self.scale_factors.len()
    }
}

fn mb_to_bytes(megabytes: f64) -> u64 {
    (megabytes * BYTES_PER_MB) as u64
}
