use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use marginalia_core::overlay::{render_highlights, render_search_hits};
use marginalia_core::search::{SearchOptions, search};
use marginalia_core::{EngineConfig, Highlight, HighlightColor, Surface, TextIndex};

fn large_document(paragraph_count: usize) -> Vec<String> {
    (0..paragraph_count)
        .map(|i| format!("{i:06} The quick brown fox jumps over the lazy dog. It was not amused."))
        .collect()
}

fn bench_index_build(c: &mut Criterion) {
    let surface = Surface::from_paragraphs(&large_document(10_000));
    c.bench_function("index_build/10k_paragraphs", |b| {
        b.iter(|| {
            let index = TextIndex::build(black_box(&surface));
            black_box(index.char_count());
        })
    });
}

fn bench_search_common_word(c: &mut Criterion) {
    let surface = Surface::from_paragraphs(&large_document(10_000));
    let text = TextIndex::build(&surface).text().to_string();
    c.bench_function("search/the_10k_paragraphs", |b| {
        b.iter(|| {
            let hits = search(black_box(&text), "the", SearchOptions::default(), 2);
            black_box(hits.len());
        })
    });
}

fn bench_render_highlights(c: &mut Criterion) {
    let paragraphs = large_document(2_000);
    let surface = Surface::from_paragraphs(&paragraphs);
    let index = TextIndex::build(&surface);
    // One highlight on "quick" in every tenth paragraph.
    let highlights: Vec<Highlight> = index
        .spans()
        .iter()
        .filter(|s| s.len() > 20)
        .step_by(10)
        .enumerate()
        .map(|(i, s)| Highlight::new(format!("h{i}"), s.start + 11, s.start + 16, HighlightColor::Gold, "quick"))
        .collect();
    let config = EngineConfig::default();

    c.bench_function("overlay/render_200_highlights", |b| {
        b.iter_batched(
            || surface.clone(),
            |mut surface| {
                let report = render_highlights(&mut surface, &highlights, &config);
                black_box(report.wrapped_segments);
            },
            BatchSize::LargeInput,
        )
    });

    let mut rendered = surface.clone();
    render_highlights(&mut rendered, &highlights, &config);
    c.bench_function("overlay/rerender_unchanged", |b| {
        b.iter(|| {
            let report = render_highlights(&mut rendered, &highlights, &config);
            black_box(report.unchanged);
        })
    });
}

fn bench_render_search_hits(c: &mut Criterion) {
    let surface = Surface::from_paragraphs(&large_document(2_000));
    let text = TextIndex::build(&surface).text().to_string();
    let hits = search(&text, "the", SearchOptions::default(), 2);
    let config = EngineConfig::default();

    c.bench_function("overlay/render_4k_search_hits", |b| {
        b.iter_batched(
            || surface.clone(),
            |mut surface| {
                let report = render_search_hits(&mut surface, &hits, Some(0), &config);
                black_box(report.wrapped_segments);
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_index_build,
    bench_search_common_word,
    bench_render_highlights,
    bench_render_search_hits
);
criterion_main!(benches);
