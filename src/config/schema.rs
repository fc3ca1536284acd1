//! Configuration schema types for `tilegif.toml`
//!
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::assemble::MAX_GIF_DIMENSION;
use crate::batch::{default_jobs, BatchOptions, DEFAULT_NAME_TEMPLATE};
use crate::models::Size;
use crate::tiler::{TileOptions, DEFAULT_TARGET};

/// Root of a `tilegif.toml` file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TilegifConfig {
    #[serde(default)]
    pub tile: TileConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// `[tile]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileConfig {
    /// Output canvas size [width, height]
    #[serde(default = "default_target")]
    pub target: [u32; 2],
    /// Leave existing outputs untouched
    #[serde(default)]
    pub skip_existing: bool,
    /// Reuse transparency masks across identical frames
    #[serde(default = "default_true")]
    pub mask_cache: bool,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self { target: default_target(), skip_existing: false, mask_cache: true }
    }
}

fn default_target() -> [u32; 2] {
    [DEFAULT_TARGET.width, DEFAULT_TARGET.height]
}

fn default_true() -> bool {
    true
}

/// `[batch]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Output directory for batch runs
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    /// Parallel jobs; defaults to available parallelism
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Output file name with `{stem}`, `{width}` and `{height}` placeholders
    #[serde(default = "default_name_template")]
    pub name_template: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { out_dir: default_out_dir(), jobs: None, name_template: default_name_template() }
    }
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("generated_effects")
}

fn default_name_template() -> String {
    DEFAULT_NAME_TEMPLATE.to_string()
}

/// A single validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Dotted field path, e.g. "tile.target"
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tilegif.toml: '{}' {}", self.field, self.message)
    }
}

impl TilegifConfig {
    /// Collect every validation problem; empty when the config is usable.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut error = |field: &str, message: &str| {
            errors.push(ConfigValidationError {
                field: field.to_string(),
                message: message.to_string(),
            })
        };

        let [width, height] = self.tile.target;
        if width == 0 || height == 0 {
            error("tile.target", "dimensions must be positive");
        } else if width > MAX_GIF_DIMENSION || height > MAX_GIF_DIMENSION {
            error("tile.target", "dimensions must not exceed 65535");
        }

        if self.batch.jobs == Some(0) {
            error("batch.jobs", "must be a positive integer");
        }
        if self.batch.out_dir.as_os_str().is_empty() {
            error("batch.out_dir", "must be a non-empty path");
        }
        if !self.batch.name_template.contains("{stem}") {
            error("batch.name_template", "must contain the {stem} placeholder");
        }

        errors
    }

    pub fn target(&self) -> Size {
        Size::new(self.tile.target[0], self.tile.target[1])
    }

    pub fn tile_options(&self) -> TileOptions {
        TileOptions { skip_existing: self.tile.skip_existing, mask_cache: self.tile.mask_cache }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            out_dir: self.batch.out_dir.clone(),
            target: self.target(),
            jobs: self.batch.jobs.unwrap_or_else(default_jobs),
            name_template: self.batch.name_template.clone(),
            tile: self.tile_options(),
        }
    }
}
