//! Transparency mask resolution
//!
//! A palette-indexed frame marks a pixel transparent when its colour equals
//! the palette colour at the transparency index. Masks are memoized in a
//! [`MaskCache`] keyed by frame content and index, since the same frame and
//! index recur across a tiling run and across batches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::models::{palette_color, palette_contains, FramePixels, SourceFrame};

/// Per-pixel transparency, row-major, `true` = transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparencyMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl TransparencyMask {
    /// A mask with nothing transparent.
    pub fn opaque(width: u32, height: u32) -> Self {
        Self { width, height, bits: vec![false; width as usize * height as usize] }
    }

    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Self {
        debug_assert_eq!(bits.len(), width as usize * height as usize);
        Self { width, height, bits }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn transparent_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn is_all_opaque(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }
}

/// Cache key: content hash of the frame plus the transparency index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskKey {
    pub content_hash: u64,
    pub transparency_index: u8,
}

/// Append-only mask cache, safe to share between threads.
///
/// Entries are never replaced or mutated once inserted, so readers only ever
/// see complete masks.
#[derive(Debug, Default)]
pub struct MaskCache {
    entries: RwLock<HashMap<MaskKey, Arc<TransparencyMask>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MaskKey) -> Option<Arc<TransparencyMask>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let found = entries.get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Insert a mask unless another thread got there first; returns the stored entry.
    pub fn insert(&self, key: MaskKey, mask: TransparencyMask) -> Arc<TransparencyMask> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(entries.entry(key).or_insert_with(|| Arc::new(mask)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// FNV-1a over the frame dimensions, palette and index data.
pub fn content_hash(width: u32, height: u32, indices: &[u8], palette: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    let dims = [width.to_le_bytes(), height.to_le_bytes()];
    let len = (palette.len() as u32).to_le_bytes();
    for chunk in [&dims[0][..], &dims[1][..], &len[..], palette, indices] {
        for byte in chunk {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Resolve the transparency mask of `frame` for `transparency_index`.
///
/// Direct-colour frames, frames without a transparency index and indices
/// outside the palette all resolve to an opaque mask without touching the
/// cache. Passing `None` for `cache` gives identical results, only slower.
pub fn resolve_mask(
    frame: &SourceFrame,
    transparency_index: Option<u8>,
    cache: Option<&MaskCache>,
) -> Arc<TransparencyMask> {
    let (indices, palette, index) = match (&frame.pixels, transparency_index) {
        (FramePixels::Indexed { indices, palette }, Some(index)) => (indices, palette, index),
        _ => return Arc::new(TransparencyMask::opaque(frame.width, frame.height)),
    };
    if !palette_contains(palette, index) {
        return Arc::new(TransparencyMask::opaque(frame.width, frame.height));
    }

    let Some(cache) = cache else {
        return Arc::new(compute_mask(frame.width, frame.height, indices, palette, index));
    };

    let key = MaskKey {
        content_hash: content_hash(frame.width, frame.height, indices, palette),
        transparency_index: index,
    };
    if let Some(mask) = cache.get(&key) {
        return mask;
    }
    cache.insert(key, compute_mask(frame.width, frame.height, indices, palette, index))
}

fn compute_mask(
    width: u32,
    height: u32,
    indices: &[u8],
    palette: &[u8],
    index: u8,
) -> TransparencyMask {
    let key_color = palette_color(palette, index);

    // Several indices may share the key colour; resolve per index once.
    let mut by_index = [false; 256];
    for (i, slot) in by_index.iter_mut().enumerate() {
        *slot = palette_color(palette, i as u8) == key_color;
    }

    let bits = indices.iter().map(|&i| by_index[i as usize]).collect();
    TransparencyMask::from_bits(width, height, bits)
}
