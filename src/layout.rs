//! Tile layout calculation
//!
//! Works out how many copies of a frame are needed to cover the target canvas
//! and which mirror transform each grid cell gets.

use crate::error::TileError;
use crate::models::{Size, TileLayout};

/// Mirror transform applied to one tile, derived from its grid parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileOrientation {
    /// Mirror left-right (odd column)
    pub mirror_h: bool,
    /// Flip top-bottom (odd row)
    pub flip_v: bool,
}

impl TileOrientation {
    /// Orientation of the tile at grid position `(x, y)`.
    pub fn at(x: u32, y: u32) -> Self {
        Self { mirror_h: x % 2 == 1, flip_v: y % 2 == 1 }
    }

    /// Index into a `[orig, h, v, hv]` variant table.
    pub fn variant_index(&self) -> usize {
        (self.mirror_h as usize) | ((self.flip_v as usize) << 1)
    }
}

/// Compute the tile grid covering `target` with copies of a `frame`-sized tile.
///
/// Both counts are ceiling divisions, so the last row/column may hang past
/// the canvas edge and gets clipped at paste time.
///
/// # Errors
///
/// * [`TileError::InvalidFrameSize`] if either frame dimension is zero
/// * [`TileError::InvalidTargetSize`] if either target dimension is zero
pub fn compute_layout(frame: Size, target: Size) -> Result<TileLayout, TileError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(TileError::InvalidFrameSize {
            width: frame.width,
            height: frame.height,
            frame_index: None,
        });
    }
    if target.width == 0 || target.height == 0 {
        return Err(TileError::InvalidTargetSize { width: target.width, height: target.height });
    }

    Ok(TileLayout {
        tiles_x: target.width.div_ceil(frame.width),
        tiles_y: target.height.div_ceil(frame.height),
        frame,
        target,
    })
}

impl TileLayout {
    /// Iterate every tile as `(x, y, paste_x, paste_y)`, row by row.
    ///
    /// Paste offsets are `u64` since `tiles * frame` may exceed `u32` for
    /// degenerate ratios; anything past the canvas is skipped by the caller.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32, u64, u64)> + '_ {
        (0..self.tiles_y).flat_map(move |y| {
            (0..self.tiles_x).map(move |x| {
                (x, y, x as u64 * self.frame.width as u64, y as u64 * self.frame.height as u64)
            })
        })
    }
}
