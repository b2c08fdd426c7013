use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use styletext_api::{
    apply_alpha, AspectPreservingResizer, ChromaKey, ImageCodec, UpscaleRestorer,
};

/// Style-like input: diagonal gradient with a darker band through the middle
fn style_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let band = y > height / 3 && y < 2 * height / 3;
        let base = ((x + y) * 255 / (width + height)) as u8;
        if band {
            Rgb([base / 3, base / 2, 30])
        } else {
            Rgb([base, 255 - base, 180])
        }
    })
}

/// Generator-like output: gray background with alternating glyph strokes
fn fake_text(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x / 4) % 2 == 0 && y > 6 && y + 6 < height {
            Rgb([210, 40, 60])
        } else {
            Rgb([128, 128, 128])
        }
    })
}

fn benchmark_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for (width, height) in [(320, 160), (1280, 480), (3000, 1000)] {
        let image = style_image(width, height);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &image,
            |b, image| {
                b.iter(|| {
                    AspectPreservingResizer::resize_to_height(black_box(image.clone()), 32)
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

fn benchmark_matte(c: &mut Criterion) {
    let mut group = c.benchmark_group("matte");
    let key = ChromaKey::default();

    for width in [64, 256, 1024] {
        let text = fake_text(width, 32);
        group.bench_with_input(BenchmarkId::new("extract_apply", width), &text, |b, text| {
            b.iter(|| {
                let mask = key.extract_alpha(black_box(text));
                apply_alpha(text, &mask)
            });
        });
    }

    group.finish();
}

fn benchmark_restore(c: &mut Criterion) {
    let mut group = c.benchmark_group("restore");
    let key = ChromaKey::default();
    let text = fake_text(128, 32);
    let rgba = apply_alpha(&text, &key.extract_alpha(&text));

    for (width, height) in [(200, 50), (800, 200), (2400, 600)] {
        group.bench_function(format!("{}x{}", width, height), |b| {
            b.iter(|| UpscaleRestorer::restore_size(black_box(rgba.clone()), width, height).unwrap());
        });
    }

    group.finish();
}

fn benchmark_codec(c: &mut Criterion) {
    let png = ImageCodec::encode_png(&DynamicImage::ImageRgb8(style_image(1280, 480))).unwrap();

    c.bench_function("decode_png_1280x480", |b| {
        b.iter(|| ImageCodec::decode(black_box(&png)).unwrap());
    });
}

criterion_group!(
    pipeline_benches,
    benchmark_normalize,
    benchmark_matte,
    benchmark_restore,
    benchmark_codec
);
criterion_main!(pipeline_benches);
