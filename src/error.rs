//! Error types for tiling operations

use std::path::PathBuf;
use thiserror::Error;

/// Error raised while tiling an animation.
///
/// Every variant carries enough context (input path, frame index) to be
/// logged on its own. [`TileError::is_recoverable`] separates bad input from
/// failures the caller has to look at.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TileError {
    /// Input path does not exist
    #[error("Source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Input could not be parsed as an animated raster image
    #[error("Failed to decode '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// Input decoded but contained no frames
    #[error("No frames in '{}'", path.display())]
    EmptySource { path: PathBuf },

    /// A frame with a zero dimension reached the layout stage
    #[error("Invalid frame size {width}x{height}{}", frame_index.map(|i| format!(" at frame {}", i)).unwrap_or_default())]
    InvalidFrameSize { width: u32, height: u32, frame_index: Option<usize> },

    /// Target canvas with a zero dimension
    #[error("Invalid target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    /// Output could not be written
    #[error("Failed to write '{}': {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: EncodeCause,
    },

    /// Internal inconsistency, indicates a bug rather than bad input
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

/// Underlying cause of an [`TileError::Encode`] failure.
#[derive(Debug, Error)]
pub enum EncodeCause {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GIF encoding error: {0}")]
    Gif(#[from] gif::EncodingError),
    #[error("{0}")]
    Unsupported(String),
}

impl TileError {
    /// Whether this failure is reported as a plain `false` by
    /// [`crate::create_tiled_animation`] instead of an error.
    ///
    /// Missing input, undecodable input and empty input are recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TileError::SourceNotFound { .. }
                | TileError::Decode { .. }
                | TileError::EmptySource { .. }
        )
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TileError::Decode { path: path.into(), reason: reason.to_string() }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, source: impl Into<EncodeCause>) -> Self {
        TileError::Encode { path: path.into(), source: source.into() }
    }
}
