//! Stitching benchmark suite.
//!
//! Benchmarks band planning and compositing for tall selections:
//! - Selection heights: 1, 4 and 12 viewports
//! - Device pixel ratios: 1, 2
//!
//! Run with: cargo bench --bench stitch
//! Results saved to: target/criterion/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use web_clipper::clip::{
    CapturedSegment, ImageFormat, ScrollOffset, SelectionRect, Viewport, composite, plan_bands,
};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const VIEWPORT_WIDTH: f64 = 1280.0;
const VIEWPORT_HEIGHT: f64 = 720.0;
const VIEWPORT_COUNTS: &[f64] = &[1.0, 4.0, 12.0];
const DEVICE_PIXEL_RATIOS: &[f64] = &[1.0, 2.0];

// ============================================================================
// Fixtures
// ============================================================================

/// Selection spanning `viewports` viewport heights, starting mid-page.
fn selection(viewports: f64) -> SelectionRect {
    SelectionRect::from_origin_size(100.0, 300.0, 800.0, VIEWPORT_HEIGHT * viewports)
}

/// Captured segments for a page that never clamps the scroll.
fn segments(rect: &SelectionRect, viewport: &Viewport) -> Vec<CapturedSegment> {
    let width = viewport.to_device(viewport.width);
    let height = viewport.to_device(viewport.height);

    plan_bands(rect, viewport)
        .into_iter()
        .map(|band| CapturedSegment {
            band,
            scroll: ScrollOffset::new(0.0, band.scroll_y),
            image: RgbaImage::from_pixel(width, height, Rgba([40, 90, 160, 255])),
        })
        .collect()
}

// ============================================================================
// Benchmark: Band Planning
// ============================================================================

fn bench_plan_bands(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_bands");
    let viewport = Viewport::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT, 1.0).expect("viewport");

    for &count in VIEWPORT_COUNTS {
        let rect = selection(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &rect, |b, rect| {
            b.iter(|| plan_bands(rect, &viewport));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Compositing
// ============================================================================

fn bench_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite");
    group.sample_size(20);

    for &dpr in DEVICE_PIXEL_RATIOS {
        let viewport = Viewport::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT, dpr).expect("viewport");

        for &count in VIEWPORT_COUNTS {
            let rect = selection(count);
            let captured = segments(&rect, &viewport);

            group.bench_with_input(
                BenchmarkId::new(format!("dpr{dpr}"), count),
                &captured,
                |b, captured| {
                    b.iter(|| composite(rect, viewport, captured).expect("composite"));
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Encoding
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.sample_size(10);

    let viewport = Viewport::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT, 1.0).expect("viewport");
    let rect = selection(4.0);
    let compositor = composite(rect, viewport, &segments(&rect, &viewport)).expect("composite");

    for (name, format) in [("png", ImageFormat::png()), ("jpeg90", ImageFormat::jpeg(90))] {
        group.bench_function(name, |b| {
            b.iter(|| compositor.to_data_url(format).expect("encode"));
        });
    }

    group.finish();
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(benches, bench_plan_bands, bench_composite, bench_encode);
criterion_main!(benches);
