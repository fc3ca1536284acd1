//! Tiling pipeline
//!
//! Drives one source file through extraction, layout, mask resolution,
//! compositing and assembly. A run either writes one complete output file or
//! fails without touching it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::assemble::assemble_frames;
use crate::compose::composite_frame;
use crate::error::TileError;
use crate::extract::Frames;
use crate::layout::compute_layout;
use crate::mask::{resolve_mask, MaskCache};
use crate::models::{Size, TileLayout};

/// Default target canvas.
pub const DEFAULT_TARGET: Size = Size::new(1080, 1080);

/// Stage of a tiling run, used for progress logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Opened,
    Extracting,
    LayoutComputed,
    MaskResolved,
    Composited,
    Assembling,
    Written,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Opened => "opened",
            Stage::Extracting => "extracting",
            Stage::LayoutComputed => "layout-computed",
            Stage::MaskResolved => "mask-resolved",
            Stage::Composited => "composited",
            Stage::Assembling => "assembling",
            Stage::Written => "written",
        };
        f.write_str(name)
    }
}

/// Options for a [`Tiler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileOptions {
    /// Report success without regenerating when the output already exists
    pub skip_existing: bool,
    /// Memoize transparency masks
    pub mask_cache: bool,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self { skip_existing: false, mask_cache: true }
    }
}

/// Outcome of a successful tiling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub target: Size,
    /// Source logical screen size (unknown when skipped)
    pub source_size: Option<Size>,
    pub frame_count: usize,
    /// Layout of the last frame (unknown when skipped)
    pub layout: Option<TileLayout>,
    pub durations: Vec<u32>,
    pub disposals: Vec<u8>,
    pub mask_cache_hits: u64,
    /// Existing output was kept
    pub skipped: bool,
}

/// Tiles animations onto a fixed canvas.
///
/// Holds the transparency mask cache; clone the `Arc` with
/// [`Tiler::with_cache`] to share one cache between tilers on different threads.
#[derive(Debug, Clone)]
pub struct Tiler {
    options: TileOptions,
    cache: Arc<MaskCache>,
}

impl Default for Tiler {
    fn default() -> Self {
        Self::new(TileOptions::default())
    }
}

impl Tiler {
    pub fn new(options: TileOptions) -> Self {
        Self { options, cache: Arc::new(MaskCache::new()) }
    }

    /// Use an existing (possibly shared) mask cache.
    pub fn with_cache(mut self, cache: Arc<MaskCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn options(&self) -> &TileOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<MaskCache> {
        &self.cache
    }

    /// Tile `input` onto a `target`-sized canvas and write the result to `output`.
    ///
    /// Every error is returned; see [`Tiler::create`] for the boolean variant.
    #[tracing::instrument(skip_all, fields(input = %input.display(), output = %output.display(), target = %target))]
    pub fn tile(&self, input: &Path, output: &Path, target: Size) -> Result<TileReport, TileError> {
        if target.width == 0 || target.height == 0 {
            return Err(TileError::InvalidTargetSize { width: target.width, height: target.height });
        }
        if self.options.skip_existing && output.exists() {
            info!("Tiled animation already exists, skipping");
            return Ok(TileReport {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
                target,
                source_size: None,
                frame_count: 0,
                layout: None,
                durations: Vec::new(),
                disposals: Vec::new(),
                mask_cache_hits: 0,
                skipped: true,
            });
        }

        let frames = Frames::open(input)?;
        let source_size = frames.info().size;
        debug!(stage = %Stage::Opened, source = %source_size, format = ?frames.info().format);

        let cache = self.options.mask_cache.then(|| self.cache.as_ref());
        let hits_before = self.cache.hits();

        let mut outputs = Vec::new();
        let mut last_layout = None;

        for item in frames {
            let (frame, index) = item?;
            debug!(
                stage = %Stage::Extracting,
                frame = index,
                duration_ms = frame.duration_ms,
                disposal = frame.disposal_method
            );

            let layout = compute_layout(frame.size(), target).map_err(|e| match e {
                TileError::InvalidFrameSize { width, height, .. } => {
                    TileError::InvalidFrameSize { width, height, frame_index: Some(index) }
                }
                other => other,
            })?;
            debug!(
                stage = %Stage::LayoutComputed,
                frame = index,
                tiles_x = layout.tiles_x,
                tiles_y = layout.tiles_y
            );

            let mask = resolve_mask(&frame, frame.transparency_index, cache);
            debug!(
                stage = %Stage::MaskResolved,
                frame = index,
                transparent = mask.transparent_count()
            );

            outputs.push(composite_frame(&frame, &layout, &mask));
            last_layout = Some(layout);
            debug!(stage = %Stage::Composited, frame = index);
        }

        if outputs.is_empty() {
            return Err(TileError::EmptySource { path: input.to_path_buf() });
        }

        debug!(stage = %Stage::Assembling, frames = outputs.len());
        assemble_frames(&outputs, output)?;

        let report = TileReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            target,
            source_size: Some(source_size),
            frame_count: outputs.len(),
            layout: last_layout,
            durations: outputs.iter().map(|f| f.duration_ms).collect(),
            disposals: outputs.iter().map(|f| f.disposal_method).collect(),
            mask_cache_hits: self.cache.hits().saturating_sub(hits_before),
            skipped: false,
        };
        info!(stage = %Stage::Written, frames = report.frame_count, "Created tiled animation");
        Ok(report)
    }

    /// Like [`Tiler::tile`], but reports recoverable failures (missing,
    /// undecodable or empty input) as `Ok(false)` after logging them.
    pub fn create(&self, input: &Path, output: &Path, target: Size) -> Result<bool, TileError> {
        match self.tile(input, output, target) {
            Ok(_) => Ok(true),
            Err(e) if e.is_recoverable() => {
                warn!(input = %input.display(), error = %e, "Could not tile animation");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Tile `input` onto a `target`-sized canvas with default options.
///
/// Returns `Ok(true)` once `output` is written, `Ok(false)` when the input is
/// missing, undecodable or has no frames. Encoding failures, invalid frame
/// sizes and internal invariant violations are returned as errors.
pub fn create_tiled_animation(
    input: &Path,
    output: &Path,
    target: Size,
) -> Result<bool, TileError> {
    Tiler::default().create(input, output, target)
}
