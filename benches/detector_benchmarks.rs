//! Benchmarks for pattern detection performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weldtrack::pattern_detection::PatternDetector;

/// Dark frame with sensor-like noise and four bright marker dots
fn synthetic_frame(width: usize, height: usize) -> Vec<u8> {
    let mut frame: Vec<u8> = (0..width * height * 4)
        .map(|_| (rand::random::<u8>() % 40))
        .collect();
    for px in frame.chunks_exact_mut(4) {
        px[3] = 255;
    }

    let cx = width / 2;
    let cy = height / 2;
    for (x, y) in [
        (cx - 30, cy - 30),
        (cx + 30, cy - 30),
        (cx + 30, cy + 30),
        (cx - 30, cy + 30),
    ] {
        let idx = (y * width + x) * 4;
        frame[idx] = 255;
        frame[idx + 1] = 255;
        frame[idx + 2] = 255;
    }
    frame
}

fn benchmark_detector(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_detection");

    for &(width, height) in &[(320usize, 240usize), (640, 480)] {
        let frame = synthetic_frame(width, height);
        let detector = PatternDetector::default();

        group.bench_with_input(
            BenchmarkId::new("detect", format!("{width}x{height}")),
            &frame,
            |b, frame| {
                b.iter(|| black_box(detector.detect(black_box(frame), width, height)));
            },
        );
    }

    // Uniform frame: measures the grayscale + gradient sweep floor
    let flat = vec![128u8; 640 * 480 * 4];
    let detector = PatternDetector::default();
    group.bench_function("detect_uniform_640x480", |b| {
        b.iter(|| black_box(detector.detect(black_box(&flat), 640, 480)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_detector);
criterion_main!(benches);
