//! Tile compositing
//!
//! Normalizes a source frame to RGBA, builds its four mirror variants once,
//! and pastes the right variant at every grid cell of the target canvas.

use image::imageops::{flip_horizontal, flip_vertical};
use image::{Rgba, RgbaImage};

use crate::layout::TileOrientation;
use crate::mask::TransparencyMask;
use crate::models::{palette_color, FramePixels, OutputFrame, SourceFrame, TileLayout};

/// Convert a source frame to RGBA, clearing alpha wherever `mask` is set.
///
/// Indexed pixels are otherwise fully opaque. Direct pixels keep their own
/// alpha.
pub fn normalize_frame(frame: &SourceFrame, mask: &TransparencyMask) -> RgbaImage {
    let bits = mask.as_slice();
    match &frame.pixels {
        FramePixels::Indexed { indices, palette } => {
            let mut lut = [[0u8; 3]; 256];
            for (i, slot) in lut.iter_mut().enumerate() {
                *slot = palette_color(palette, i as u8);
            }
            let mut rgba = RgbaImage::new(frame.width, frame.height);
            for ((pixel, &index), &transparent) in rgba.pixels_mut().zip(indices).zip(bits) {
                let [r, g, b] = lut[index as usize];
                *pixel = Rgba([r, g, b, if transparent { 0 } else { 255 }]);
            }
            rgba
        }
        FramePixels::Direct { rgba } => {
            let mut out = rgba.clone();
            for (pixel, &transparent) in out.pixels_mut().zip(bits) {
                if transparent {
                    pixel[3] = 0;
                }
            }
            out
        }
    }
}

/// The four mirror variants of a tile, indexed by [`TileOrientation::variant_index`].
#[derive(Debug, Clone)]
pub struct TileVariants {
    variants: [RgbaImage; 4],
}

impl TileVariants {
    pub fn new(base: RgbaImage) -> Self {
        let mirrored = flip_horizontal(&base);
        let flipped = flip_vertical(&base);
        let both = flip_vertical(&mirrored);
        Self { variants: [base, mirrored, flipped, both] }
    }

    pub fn get(&self, orientation: TileOrientation) -> &RgbaImage {
        &self.variants[orientation.variant_index()]
    }
}

/// Apply one tile's mirror transform to `tile`.
pub fn orient_tile(tile: &RgbaImage, orientation: TileOrientation) -> RgbaImage {
    match (orientation.mirror_h, orientation.flip_v) {
        (false, false) => tile.clone(),
        (true, false) => flip_horizontal(tile),
        (false, true) => flip_vertical(tile),
        (true, true) => flip_vertical(&flip_horizontal(tile)),
    }
}

/// Paste `tile` onto `canvas` at `(x, y)`, using the tile's alpha as the paste mask.
///
/// Each channel becomes `src * a + dst * (1 - a)`: alpha 0 leaves the canvas
/// pixel alone, alpha 255 replaces it. Anything past the canvas edge is clipped.
pub fn paste_masked(canvas: &mut RgbaImage, tile: &RgbaImage, x: u64, y: u64) {
    let canvas_width = canvas.width() as u64;
    let canvas_height = canvas.height() as u64;
    if x >= canvas_width || y >= canvas_height {
        return;
    }

    for (sy, row) in tile.rows().enumerate() {
        let dest_y = y + sy as u64;
        if dest_y >= canvas_height {
            break;
        }

        for (sx, src) in row.enumerate() {
            let dest_x = x + sx as u64;
            if dest_x >= canvas_width {
                break;
            }

            let alpha = src[3] as u32;
            if alpha == 0 {
                continue;
            }

            let dst = canvas.get_pixel_mut(dest_x as u32, dest_y as u32);
            if alpha == 255 {
                *dst = *src;
                continue;
            }

            for c in 0..4 {
                let blended = src[c] as u32 * alpha + dst[c] as u32 * (255 - alpha);
                dst[c] = ((blended + 127) / 255) as u8;
            }
        }
    }
}

/// Composite one output frame: every tile of `layout`, mirrored by grid
/// parity, pasted onto a transparent canvas of the target size. Timing and
/// disposal are carried over from `frame`.
pub fn composite_frame(
    frame: &SourceFrame,
    layout: &TileLayout,
    mask: &TransparencyMask,
) -> OutputFrame {
    let variants = TileVariants::new(normalize_frame(frame, mask));
    let mut output = OutputFrame::blank(layout.target, frame.duration_ms, frame.disposal_method);

    for (x, y, paste_x, paste_y) in layout.tiles() {
        if paste_x >= layout.target.width as u64 || paste_y >= layout.target.height as u64 {
            continue;
        }
        paste_masked(&mut output.image, variants.get(TileOrientation::at(x, y)), paste_x, paste_y);
    }

    output
}
