//! tilegif - Tile animated GIFs onto a fixed-size canvas
//!
//! This library provides functionality to:
//! - Extract frames, timing and disposal methods from GIF and APNG sources
//! - Repeat each frame across a target canvas, mirroring alternate tiles
//! - Honor palette transparency through cached per-frame masks
//! - Reassemble the tiled frames into a looping GIF
//!
//! The one-call entry point is [`create_tiled_animation`]; [`Tiler`] and the
//! [`batch`] module expose the same pipeline with options and reporting.

pub mod assemble;
pub mod batch;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod extract;
pub mod inspect;
pub mod layout;
pub mod mask;
pub mod models;
pub mod palette;
pub mod tiler;

#[cfg(test)]
mod test_support;

pub use error::TileError;
pub use models::Size;
pub use tiler::{create_tiled_animation, TileOptions, TileReport, Tiler, DEFAULT_TARGET};
