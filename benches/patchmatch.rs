use criterion::{criterion_group, criterion_main, Criterion};
use patchmatch::{
    CompositeTest, HistogramTest, ImageView, Mask, PatchMatch, PatchMatchConfig, Ssd, SsdTest,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as f32);
        }
    }
    data
}

/// Source everywhere except a centered square hole, which is the target.
fn hole_masks(width: usize, height: usize, side: usize) -> (Mask, Mask) {
    let x0 = (width - side) / 2;
    let y0 = (height - side) / 2;
    let source = Mask::from_fn(width, height, |p| {
        !((x0..x0 + side).contains(&p.x) && (y0..y0 + side).contains(&p.y))
    })
    .unwrap();
    let target = source.inverted();
    (source, target)
}

fn bench_solver(c: &mut Criterion) {
    let width = 128;
    let height = 128;
    let image = make_image(width, height);
    let view = ImageView::from_slice(&image, width, height).unwrap();
    let (source, target) = hole_masks(width, height, 40);
    let cfg = PatchMatchConfig::default();

    c.bench_function("ssd_basic_5_iterations", |b| {
        b.iter(|| {
            let mut pm = PatchMatch::new(Ssd, cfg).with_seed(0);
            black_box(pm.compute(view, &source, &target).unwrap().filled_count());
        });
    });

    c.bench_function("ssd_generalized_k4", |b| {
        b.iter(|| {
            let mut pm = PatchMatch::generalized(Ssd, cfg, 4).with_seed(0);
            black_box(pm.compute(view, &source, &target).unwrap().filled_count());
        });
    });

    c.bench_function("ssd_histogram_gate", |b| {
        b.iter(|| {
            let acceptance = CompositeTest::new().with(SsdTest).with(HistogramTest::default());
            let mut pm = PatchMatch::new(Ssd, cfg)
                .with_acceptance(acceptance)
                .with_seed(0);
            black_box(pm.compute(view, &source, &target).unwrap().filled_count());
        });
    });

    #[cfg(feature = "simd")]
    {
        use patchmatch::kernel::SsdSimd;
        c.bench_function("ssd_simd_basic_5_iterations", |b| {
            b.iter(|| {
                let mut pm = PatchMatch::new(SsdSimd, cfg).with_seed(0);
                black_box(pm.compute(view, &source, &target).unwrap().filled_count());
            });
        });
    }
}

criterion_group!(benches, bench_solver);
criterion_main!(benches);
