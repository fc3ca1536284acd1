//! Source inspection
//!
//! Reads an animation without tiling it and summarizes what the tiler would
//! see: frame count, timing, disposal and transparency per frame.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use image::ImageFormat;
use serde::Serialize;

use crate::error::TileError;
use crate::extract::extract;
use crate::models::{Size, SourceFormat};

/// How many times an animation plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopCount {
    Infinite,
    /// Extra repetitions after the first play
    Finite(u16),
}

impl From<gif::Repeat> for LoopCount {
    fn from(repeat: gif::Repeat) -> Self {
        match repeat {
            gif::Repeat::Infinite => LoopCount::Infinite,
            gif::Repeat::Finite(n) => LoopCount::Finite(n),
        }
    }
}

/// Per-frame details of an inspected source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameSummary {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub duration_ms: u32,
    pub disposal_method: u8,
    pub transparency_index: Option<u8>,
}

/// Summary of a source animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnimationSummary {
    pub format: SourceFormat,
    pub size: Size,
    pub frame_count: usize,
    pub total_duration_ms: u64,
    /// `None` for formats without a loop setting
    pub loop_count: Option<LoopCount>,
    pub background_index: Option<u8>,
    pub frames: Vec<FrameSummary>,
}

impl AnimationSummary {
    pub fn durations(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.duration_ms).collect()
    }

    pub fn disposals(&self) -> Vec<u8> {
        self.frames.iter().map(|f| f.disposal_method).collect()
    }
}

/// Whether `path` starts with a GIF signature.
///
/// Missing or unreadable files are simply not GIFs.
pub fn is_gif(path: &Path) -> bool {
    let mut header = [0u8; 6];
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    match file.read_exact(&mut header) {
        Ok(()) => matches!(image::guess_format(&header), Ok(ImageFormat::Gif)),
        Err(_) => false,
    }
}

/// Decode every frame of `path` and summarize it.
///
/// Durations and disposal methods are reported after defaulting, exactly as
/// the tiler would carry them into the output.
pub fn summarize(path: &Path) -> Result<AnimationSummary, TileError> {
    let mut frames = extract(path)?;
    let info = frames.info().clone();

    let mut summaries = Vec::new();
    for item in frames.by_ref() {
        let (frame, index) = item?;
        summaries.push(FrameSummary {
            index,
            width: frame.width,
            height: frame.height,
            duration_ms: frame.duration_ms,
            disposal_method: frame.disposal_method,
            transparency_index: frame.transparency_index,
        });
    }

    Ok(AnimationSummary {
        format: info.format,
        size: info.size,
        frame_count: summaries.len(),
        total_duration_ms: summaries.iter().map(|f| f.duration_ms as u64).sum(),
        loop_count: frames.repeat().map(LoopCount::from),
        background_index: info.background_index,
        frames: summaries,
    })
}
