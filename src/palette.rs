//! Output palette construction
//!
//! Every written frame gets its own 256-entry colour table. Index
//! [`OUTPUT_TRANSPARENT_INDEX`] is reserved for transparent pixels; opaque
//! colours take indices 1..=255, exactly when they fit and through a median
//! cut reduction otherwise.

use image::RgbaImage;
use std::collections::HashMap;

use crate::models::OUTPUT_TRANSPARENT_INDEX;

/// Alpha below this is written as the transparent index.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Opaque colours available per frame.
pub const MAX_OPAQUE_COLORS: usize = 255;

type Rgb = [u8; 3];

/// An indexed frame ready for the GIF encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    /// Packed RGB, always 256 entries
    pub palette: Vec<u8>,
    pub indices: Vec<u8>,
    /// Whether the colours had to be reduced
    pub quantized: bool,
}

/// A box of colours for the median cut.
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<(Rgb, u32)>,
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Red,
    Green,
    Blue,
}

impl ColorBox {
    fn widest_channel(&self) -> Channel {
        let mut min = [255u8; 3];
        let mut max = [0u8; 3];
        for (color, _) in &self.colors {
            for c in 0..3 {
                min[c] = min[c].min(color[c]);
                max[c] = max[c].max(color[c]);
            }
        }
        let range: Vec<u8> = (0..3).map(|c| max[c].saturating_sub(min[c])).collect();

        if range[0] >= range[1] && range[0] >= range[2] {
            Channel::Red
        } else if range[1] >= range[2] {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    /// Split along the widest channel at the pixel-count median.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let channel = self.widest_channel();
        self.colors.sort_by_key(|(color, _)| match channel {
            Channel::Red => (color[0], color[1], color[2]),
            Channel::Green => (color[1], color[2], color[0]),
            Channel::Blue => (color[2], color[0], color[1]),
        });

        let total: u64 = self.pixel_count();
        let mut running = 0u64;
        let mut split_idx = self.colors.len() / 2;
        for (i, (_, count)) in self.colors.iter().enumerate() {
            running += *count as u64;
            if running >= total / 2 {
                split_idx = i + 1;
                break;
            }
        }

        // never leave a side empty
        split_idx = split_idx.clamp(1, self.colors.len() - 1);

        let right = self.colors.split_off(split_idx);
        (ColorBox { colors: self.colors }, ColorBox { colors: right })
    }

    /// Pixel-weighted average colour.
    fn average_color(&self) -> Rgb {
        let total = self.pixel_count().max(1);
        let mut sum = [0u64; 3];
        for (color, count) in &self.colors {
            for c in 0..3 {
                sum[c] += color[c] as u64 * *count as u64;
            }
        }
        [(sum[0] / total) as u8, (sum[1] / total) as u8, (sum[2] / total) as u8]
    }

    fn pixel_count(&self) -> u64 {
        self.colors.iter().map(|(_, count)| *count as u64).sum()
    }
}

/// Reduce `colors` (in first-seen order) to at most `max_colors` representatives.
fn median_cut(colors: Vec<(Rgb, u32)>, max_colors: usize) -> Vec<Rgb> {
    if colors.len() <= max_colors {
        return colors.into_iter().map(|(c, _)| c).collect();
    }

    let mut boxes = vec![ColorBox { colors }];
    while boxes.len() < max_colors {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.colors.len() > 1)
            .max_by_key(|(_, b)| b.pixel_count())
            .map(|(i, _)| i);
        let Some(idx) = candidate else {
            break;
        };
        let (left, right) = boxes.remove(idx).split();
        boxes.push(left);
        boxes.push(right);
    }

    boxes.iter().map(ColorBox::average_color).collect()
}

fn nearest(palette: &[Rgb], color: Rgb) -> usize {
    let distance = |p: &Rgb| -> u32 {
        (0..3)
            .map(|c| {
                let d = p[c] as i32 - color[c] as i32;
                (d * d) as u32
            })
            .sum()
    };
    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| distance(p))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Build the colour table and index buffer for one output frame.
pub fn index_frame(image: &RgbaImage) -> IndexedFrame {
    let mut order: Vec<(Rgb, u32)> = Vec::new();
    let mut seen: HashMap<Rgb, usize> = HashMap::new();
    for pixel in image.pixels() {
        if pixel[3] < ALPHA_THRESHOLD {
            continue;
        }
        let rgb = [pixel[0], pixel[1], pixel[2]];
        match seen.get(&rgb) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                seen.insert(rgb, order.len());
                order.push((rgb, 1));
            }
        }
    }

    let quantized = order.len() > MAX_OPAQUE_COLORS;
    let colors = median_cut(order, MAX_OPAQUE_COLORS);

    let mut lookup: HashMap<Rgb, u8> = HashMap::with_capacity(colors.len());
    if !quantized {
        for (i, color) in colors.iter().enumerate() {
            lookup.insert(*color, (i + 1) as u8);
        }
    }

    let mut indices = Vec::with_capacity(image.width() as usize * image.height() as usize);
    for pixel in image.pixels() {
        if pixel[3] < ALPHA_THRESHOLD {
            indices.push(OUTPUT_TRANSPARENT_INDEX);
            continue;
        }
        let rgb = [pixel[0], pixel[1], pixel[2]];
        let index =
            *lookup.entry(rgb).or_insert_with(|| (nearest(&colors, rgb) + 1) as u8);
        indices.push(index);
    }

    let mut palette = vec![0u8; 256 * 3];
    for (i, color) in colors.iter().enumerate() {
        let slot = (i + 1) * 3;
        palette[slot..slot + 3].copy_from_slice(color);
    }

    IndexedFrame { palette, indices, quantized }
}
