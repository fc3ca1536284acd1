//! Criterion benchmarks for the per-frame tiling path
//!
//! Benchmarks the core performance-critical operations:
//! - Mask: transparency mask computation, cold and cached
//! - Compose: tiling one frame across the target canvas
//! - Palette: indexing a composited frame for the GIF encoder

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgba, RgbaImage};
use tilegif::compose::composite_frame;
use tilegif::layout::compute_layout;
use tilegif::mask::{resolve_mask, MaskCache};
use tilegif::models::{Size, SourceFrame};
use tilegif::palette::index_frame;

// =============================================================================
// Test Data Generators
// =============================================================================

/// Indexed frame with a 16 colour palette and a transparent index 0 border
fn make_indexed_frame(size: u32) -> SourceFrame {
    let palette: Vec<u8> = (0..16u8).flat_map(|i| [i * 16, 255 - i * 16, i * 8]).collect();
    let indices: Vec<u8> = (0..size * size)
        .map(|i| {
            let (x, y) = (i % size, i / size);
            if x == 0 || y == 0 {
                0
            } else {
                (1 + (x + y) % 15) as u8
            }
        })
        .collect();
    let mut frame = SourceFrame::indexed(size, size, indices, palette);
    frame.transparency_index = Some(0);
    frame
}

/// Canvas with many distinct colours, forcing palette reduction
fn make_busy_canvas(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

// =============================================================================
// Mask Benchmarks
// =============================================================================

fn bench_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask");

    for size in [32, 64, 128].iter() {
        let frame = make_indexed_frame(*size);
        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(
            BenchmarkId::new("resolve_uncached", format!("{}x{}", size, size)),
            &frame,
            |b, frame| b.iter(|| resolve_mask(black_box(frame), Some(0), None)),
        );

        let cache = MaskCache::new();
        group.bench_with_input(
            BenchmarkId::new("resolve_cached", format!("{}x{}", size, size)),
            &frame,
            |b, frame| b.iter(|| resolve_mask(black_box(frame), Some(0), Some(&cache))),
        );
    }

    group.finish();
}

// =============================================================================
// Compose Benchmarks
// =============================================================================

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    group.sample_size(20);

    for (frame_size, target) in [(32, 256), (64, 512), (100, 1080)].iter() {
        let frame = make_indexed_frame(*frame_size);
        let mask = resolve_mask(&frame, Some(0), None);
        let layout = compute_layout(frame.size(), Size::new(*target, *target))
            .expect("bench layout is valid");

        group.throughput(Throughput::Elements((*target as u64) * (*target as u64)));
        group.bench_with_input(
            BenchmarkId::new("composite_frame", format!("{}->{}", frame_size, target)),
            &(frame, layout, mask),
            |b, (frame, layout, mask)| {
                b.iter(|| composite_frame(black_box(frame), black_box(layout), black_box(mask)))
            },
        );
    }

    group.finish();
}

// =============================================================================
// Palette Benchmarks
// =============================================================================

fn bench_palette(c: &mut Criterion) {
    let mut group = c.benchmark_group("palette");
    group.sample_size(20);

    let few_colors = RgbaImage::from_fn(256, 256, |x, y| {
        Rgba([(x % 16) as u8 * 16, (y % 8) as u8 * 32, 0, 255])
    });
    group.bench_function("index_exact_256", |b| b.iter(|| index_frame(black_box(&few_colors))));

    for size in [128, 256].iter() {
        let canvas = make_busy_canvas(*size);
        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(
            BenchmarkId::new("index_quantized", format!("{}x{}", size, size)),
            &canvas,
            |b, canvas| b.iter(|| index_frame(black_box(canvas))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_mask, bench_compose, bench_palette);
criterion_main!(benches);
