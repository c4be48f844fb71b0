use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pagesense_core::{Analyzer, ContentExtractor, Document, calculate_readability, weighted_payload};

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{}", name)).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let small = read_fixture("landing.html");
    let medium = read_fixture("article.html");

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "landing"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "article"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let html = read_fixture("article.html");
    let doc = Document::parse(&html).unwrap();
    let deep_read = ContentExtractor::deep_read();
    let weighted = ContentExtractor::weighted();

    let mut group = c.benchmark_group("extraction");
    group.bench_function("deep_read", |b| b.iter(|| deep_read.extract(black_box(&doc))));
    group.bench_function("weighted", |b| b.iter(|| weighted.extract(black_box(&doc))));
    group.bench_function("payload", |b| b.iter(|| weighted_payload(black_box(&doc))));
    group.finish();
}

fn bench_readability(c: &mut Criterion) {
    let html = read_fixture("article.html");
    let text = ContentExtractor::deep_read().extract(&Document::parse(&html).unwrap()).text;

    c.bench_function("readability", |b| b.iter(|| calculate_readability(black_box(&text))));
}

fn bench_full_analysis(c: &mut Criterion) {
    let html = read_fixture("article.html");
    let analyzer = Analyzer::new();

    c.bench_function("full_analysis", |b| b.iter(|| analyzer.analyze_html(black_box(&html), None)));
}

criterion_group!(
    benches,
    bench_parse,
    bench_extraction,
    bench_readability,
    bench_full_analysis
);
criterion_main!(benches);
