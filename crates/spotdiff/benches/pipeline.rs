use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use spotdiff::{Comparator, MapRegionDetector, RegionDetector, Rect, Settings};

/// Deterministic block texture, corner-rich so the alignment stage has work.
fn make_pair_fixture(size: u32, seed: u64) -> (RgbaImage, RgbaImage) {
    let mut rng = StdRng::seed_from_u64(seed);
    let block = 16u32;
    let bw = size.div_ceil(block);
    let colors: Vec<[u8; 3]> = (0..bw * bw)
        .map(|_| {
            [
                rng.gen_range(20..=235),
                rng.gen_range(20..=235),
                rng.gen_range(20..=235),
            ]
        })
        .collect();

    let left = RgbaImage::from_fn(size, size, |x, y| {
        let c = colors[((y / block) * bw + x / block) as usize];
        Rgba([c[0], c[1], c[2], 255])
    });

    let mut right = left.clone();
    for y in (size / 2)..(size / 2 + size / 8) {
        for x in (size / 3)..(size / 3 + size / 8) {
            right.put_pixel(x, y, Rgba([250, 30, 30, 255]));
        }
    }

    (left, right)
}

fn bench_full_compare(c: &mut Criterion) {
    let comparator = Comparator::new();
    let (left, right) = make_pair_fixture(640, 7);

    c.bench_function("compare_640x640", |b| {
        b.iter(|| {
            let outcome = comparator
                .compare(black_box(&left), black_box(&right), Settings::default())
                .expect("default settings are valid");
            black_box(outcome.boxes.len())
        })
    });
}

fn bench_detector_only(c: &mut Criterion) {
    let comparator = Comparator::new();
    let (left, right) = make_pair_fixture(640, 11);
    let outcome = comparator
        .compare(&left, &right, Settings::default())
        .expect("default settings are valid");
    let map = outcome.diff_map;

    let detector = MapRegionDetector::default();
    let settings = Settings::default();

    c.bench_function("detect_from_diff_map_256", |b| {
        b.iter(|| {
            let boxes = detector.detect_from_diff_map(black_box(&map), black_box(&settings));
            black_box(boxes.len())
        })
    });
}

fn bench_override_fast_path(c: &mut Criterion) {
    let comparator = Comparator::new();
    let (left, right) = make_pair_fixture(640, 13);
    let detector = MapRegionDetector::default();

    c.bench_function("compare_with_detector_fast_path", |b| {
        b.iter(|| {
            let outcome = comparator
                .compare_with_detector(
                    black_box(&left),
                    Rect::FULL,
                    black_box(&right),
                    Rect::FULL,
                    Settings::default(),
                    &detector,
                )
                .expect("default settings are valid");
            black_box(outcome.boxes.len())
        })
    });
}

criterion_group!(
    pipeline,
    bench_full_compare,
    bench_detector_only,
    bench_override_fast_path
);
criterion_main!(pipeline);
