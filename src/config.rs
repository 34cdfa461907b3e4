//! Tunable parameters for decoding and clustering.
//!
//! Defaults reproduce the upload tool: a 150×150 area-averaged working image,
//! five colors, ten k-means restarts seeded from 0.

use serde::{Deserialize, Serialize};

use crate::color::Contrast;
use crate::error::{PaletteError, Result};

pub const DEFAULT_NUM_COLORS: usize = 5;
pub const DEFAULT_TARGET_SIZE: u32 = 150;
pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_RESTARTS: usize = 10;
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
pub const DEFAULT_CONVERGENCE: f32 = 1e-4;

/// Cluster indices are stored as `u8` by the k-means backend.
pub const MAX_COLORS: usize = 256;

/// Order of the swatches in the returned palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteOrder {
    /// Whatever order the winning k-means run left its centroids in.
    #[default]
    Clustering,
    /// Largest cluster first.
    Population,
}

/// What to do when the image has fewer distinct colors than requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficientPolicy {
    #[default]
    Fail,
    /// Shrink the palette to the number of distinct colors.
    Clamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub num_colors: usize,
    pub target_width: u32,
    pub target_height: u32,
    /// Base seed; restart `i` uses `seed + i`.
    pub seed: u64,
    pub restarts: usize,
    pub max_iterations: usize,
    pub convergence: f32,
    pub order: PaletteOrder,
    pub on_insufficient: InsufficientPolicy,
    pub contrast: Contrast,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            num_colors: DEFAULT_NUM_COLORS,
            target_width: DEFAULT_TARGET_SIZE,
            target_height: DEFAULT_TARGET_SIZE,
            seed: DEFAULT_SEED,
            restarts: DEFAULT_RESTARTS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            convergence: DEFAULT_CONVERGENCE,
            order: PaletteOrder::default(),
            on_insufficient: InsufficientPolicy::default(),
            contrast: Contrast::default(),
        }
    }
}

impl PaletteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_colors(mut self, n: usize) -> Self {
        self.num_colors = n;
        self
    }

    pub fn target_size(mut self, width: u32, height: u32) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn order(mut self, order: PaletteOrder) -> Self {
        self.order = order;
        self
    }

    pub fn on_insufficient(mut self, policy: InsufficientPolicy) -> Self {
        self.on_insufficient = policy;
        self
    }

    pub fn contrast(mut self, contrast: Contrast) -> Self {
        self.contrast = contrast;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_colors == 0 || self.num_colors > MAX_COLORS {
            return Err(PaletteError::invalid_parameter("num_colors", self.num_colors));
        }
        if self.target_width == 0 || self.target_height == 0 {
            return Err(PaletteError::invalid_parameter(
                "target_size",
                format!("{}x{}", self.target_width, self.target_height),
            ));
        }
        if self.restarts == 0 {
            return Err(PaletteError::invalid_parameter("restarts", self.restarts));
        }
        if self.max_iterations == 0 {
            return Err(PaletteError::invalid_parameter(
                "max_iterations",
                self.max_iterations,
            ));
        }
        if !(self.convergence.is_finite() && self.convergence >= 0.0) {
            return Err(PaletteError::invalid_parameter("convergence", self.convergence));
        }
        Ok(())
    }

    /// Load a config from a JSON file; missing fields take their defaults.
    #[cfg(feature = "native-bin")]
    pub fn from_json_file(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upload_tool() {
        let c = PaletteConfig::default();
        assert_eq!(c.num_colors, 5);
        assert_eq!((c.target_width, c.target_height), (150, 150));
        assert_eq!(c.seed, 0);
        assert_eq!(c.restarts, 10);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_bad_parameters() {
        let bad = [
            PaletteConfig::new().num_colors(0),
            PaletteConfig::new().num_colors(MAX_COLORS + 1),
            PaletteConfig::new().target_size(0, 150),
            PaletteConfig::new().restarts(0),
            PaletteConfig::new().max_iterations(0),
        ];
        for c in bad {
            assert!(
                matches!(c.validate(), Err(PaletteError::InvalidParameter { .. })),
                "{c:?}"
            );
        }
    }

    #[test]
    fn builder_chains() {
        let c = PaletteConfig::new()
            .num_colors(3)
            .seed(42)
            .order(PaletteOrder::Population)
            .on_insufficient(InsufficientPolicy::Clamp)
            .contrast(Contrast::Luminance);
        assert_eq!(c.num_colors, 3);
        assert_eq!(c.seed, 42);
        assert_eq!(c.order, PaletteOrder::Population);
        assert_eq!(c.on_insufficient, InsufficientPolicy::Clamp);
        assert_eq!(c.contrast, Contrast::Luminance);
    }
}
