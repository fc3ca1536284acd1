//! Data types shared by the tiling stages

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frame duration used when the source does not declare one.
pub const DEFAULT_DURATION_MS: u32 = 100;

/// Disposal method used when the source does not declare one (restore to background).
pub const DEFAULT_DISPOSAL: u8 = 2;

/// Palette index reserved for transparency in every written frame.
pub const OUTPUT_TRANSPARENT_INDEX: u8 = 0;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl FromStr for Size {
    type Err = String;

    /// Parse `"WIDTHxHEIGHT"`, e.g. `"1080x1080"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("Invalid size '{}': expected WIDTHxHEIGHT", s))?;
        let width = w.trim().parse::<u32>().map_err(|e| format!("Invalid width '{}': {}", w, e))?;
        let height =
            h.trim().parse::<u32>().map_err(|e| format!("Invalid height '{}': {}", h, e))?;
        if width == 0 || height == 0 {
            return Err(format!("Invalid size '{}': dimensions must be positive", s));
        }
        Ok(Self { width, height })
    }
}

/// Container format of a source animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Gif,
    Png,
}

/// Header information for an opened source animation.
///
/// Frames themselves are read lazily through [`crate::extract::Frames`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAnimation {
    pub format: SourceFormat,
    /// Logical screen size
    pub size: Size,
    /// Background palette index from the global header, if any
    pub background_index: Option<u8>,
}

/// Pixel storage of a source frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePixels {
    /// One palette index per pixel; `palette` is packed RGB triples.
    Indexed { indices: Vec<u8>, palette: Vec<u8> },
    /// Direct colour with its own alpha channel.
    Direct { rgba: RgbaImage },
}

impl FramePixels {
    pub fn is_indexed(&self) -> bool {
        matches!(self, FramePixels::Indexed { .. })
    }
}

/// A single decoded source frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: FramePixels,
    pub duration_ms: u32,
    /// Opaque pass-through value
    pub disposal_method: u8,
    pub transparency_index: Option<u8>,
    pub background_index: Option<u8>,
}

impl SourceFrame {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Build an indexed frame with default timing.
    pub fn indexed(width: u32, height: u32, indices: Vec<u8>, palette: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels: FramePixels::Indexed { indices, palette },
            duration_ms: DEFAULT_DURATION_MS,
            disposal_method: DEFAULT_DISPOSAL,
            transparency_index: None,
            background_index: None,
        }
    }

    /// Build a direct-colour frame with default timing.
    pub fn direct(rgba: RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: FramePixels::Direct { rgba },
            duration_ms: DEFAULT_DURATION_MS,
            disposal_method: DEFAULT_DISPOSAL,
            transparency_index: None,
            background_index: None,
        }
    }
}

/// Look up an RGB palette entry. Indices past the end of the palette read as black.
pub fn palette_color(palette: &[u8], index: u8) -> [u8; 3] {
    let i = index as usize * 3;
    match palette.get(i..i + 3) {
        Some(rgb) => [rgb[0], rgb[1], rgb[2]],
        None => [0, 0, 0],
    }
}

/// Whether `index` addresses a complete entry of `palette`.
pub fn palette_contains(palette: &[u8], index: u8) -> bool {
    index as usize * 3 + 2 < palette.len()
}

/// How many tiles cover the target canvas in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayout {
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub frame: Size,
    pub target: Size,
}

impl TileLayout {
    pub fn tile_count(&self) -> u64 {
        self.tiles_x as u64 * self.tiles_y as u64
    }
}

/// A composited frame of the target size, ready for encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFrame {
    pub image: RgbaImage,
    pub duration_ms: u32,
    pub disposal_method: u8,
}

impl OutputFrame {
    /// A fully transparent frame.
    pub fn blank(size: Size, duration_ms: u32, disposal_method: u8) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.width, size.height, Rgba([0, 0, 0, 0])),
            duration_ms,
            disposal_method,
        }
    }
}
