// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the raster side of the form filler: text tile
// rasterisation and full-page compositing at A4/150dpi.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use formfill_core::config::{FontConfig, OverflowPolicy};
use formfill_core::types::{Anchor, TextStyle};
use formfill_render::{Compositor, Overlay, TemplateDocument, TextRenderer};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// One 700x60 text tile, the default field size.
fn bench_text_tile(c: &mut Criterion) {
    let renderer = TextRenderer::new(&FontConfig::default()).expect("font database");
    let style = TextStyle::default();

    c.bench_function("text_tile (700x60)", |b| {
        b.iter(|| {
            let tile = renderer.render(black_box("12 MG Road, Bengaluru & Co."), &style);
            black_box(tile.expect("tile"));
        });
    });
}

/// Thirteen tiles plus a signature-sized block over a blank 1240x1754 page,
/// the shape of a Form 60 fill.
fn bench_compose_page(c: &mut Criterion) {
    let template = TemplateDocument::from_image(
        "bench",
        RgbaImage::from_pixel(1240, 1754, Rgba([255, 255, 255, 255])),
    );
    let tile = RgbaImage::from_pixel(700, 60, Rgba([0, 0, 0, 64]));
    let mut overlays: Vec<Overlay> = (0..13)
        .map(|i| Overlay::new(format!("field{i}"), tile.clone(), Anchor::new(100 + i * 40, 300 + i * 70)))
        .collect();
    overlays.push(Overlay::new(
        "signature",
        RgbaImage::from_pixel(250, 80, Rgba([10, 10, 80, 255])),
        Anchor::new(870, 1120),
    ));
    let compositor = Compositor::new(90, OverflowPolicy::Clip);

    c.bench_function("compose_page (1240x1754, 14 overlays)", |b| {
        b.iter(|| {
            let result = compositor.compose(black_box(&template), black_box(&overlays));
            black_box(result.expect("composition"));
        });
    });
}

criterion_group!(benches, bench_text_tile, bench_compose_page);
criterion_main!(benches);
