//! Render benchmark: Measure the pixel-to-glyph hot path.
//!
//! Target: a 640x360 frame at stride 1 in well under one 30 fps frame budget (33ms)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use halfblock::render::{line_count, render_into};
use halfblock::terminal::OutputBuffer;
use halfblock::{render, Frame};
use image::{Rgb, RgbImage};

/// A frame with a smooth gradient, so neighbouring cells mostly differ.
fn gradient(width: u32, height: u32) -> Frame {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, ((x + y) % 256) as u8])
    });
    Frame::new(1, image)
}

/// A flat frame: every cell after the first repeats its colors.
fn flat(width: u32, height: u32) -> Frame {
    Frame::new(1, RgbImage::from_pixel(width, height, Rgb([20, 40, 60])))
}

fn render_strides(c: &mut Criterion) {
    let frame = gradient(640, 360);
    let mut group = c.benchmark_group("render_640x360");

    for stride in [1u32, 3, 7, 10] {
        group.throughput(Throughput::Elements(u64::from(line_count(360, stride))));
        group.bench_with_input(BenchmarkId::from_parameter(stride), &stride, |b, &stride| {
            b.iter(|| render(black_box(&frame), black_box(stride)));
        });
    }
    group.finish();
}

fn render_reused_buffer(c: &mut Criterion) {
    let frame = gradient(1280, 720);
    let mut out = OutputBuffer::raw(1 << 20);

    c.bench_function("render_into_1280x720_stride1", |b| {
        b.iter(|| {
            out.clear();
            render_into(black_box(&frame), 1, usize::MAX, &mut out)
        });
    });
}

fn render_flat_vs_gradient(c: &mut Criterion) {
    let flat = flat(640, 360);
    let busy = gradient(640, 360);
    let mut out = OutputBuffer::raw(1 << 20);

    c.bench_function("render_into_flat", |b| {
        b.iter(|| {
            out.clear();
            render_into(black_box(&flat), 1, usize::MAX, &mut out)
        });
    });

    c.bench_function("render_into_gradient", |b| {
        b.iter(|| {
            out.clear();
            render_into(black_box(&busy), 1, usize::MAX, &mut out)
        });
    });
}

criterion_group!(
    benches,
    render_strides,
    render_reused_buffer,
    render_flat_vs_gradient,
);
criterion_main!(benches);
