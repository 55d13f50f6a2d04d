//! Response parser performance benchmarks

use aitranslator::services::mock::{batch_envelope, translation_envelope};
use aitranslator::services::ResponseParser;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Envelope surrounded by the kind of chatter models add
fn wrapped_translation() -> String {
    format!(
        "Certainly! Here is the translation:\n```json\n{}\n```\nLet me know if you need changes.",
        translation_envelope("Good morning, how are you?", "Bonjour, comment allez-vous ?", "en", "fr")
    )
}

fn bench_translation_parsing(c: &mut Criterion) {
    let clean = translation_envelope("Hello", "Hola", "en", "es");
    let wrapped = wrapped_translation();
    let broken = r#"Result: {"content": {"source": "Hi", "target": "Salut",}, "metadata": {"target_locale": "fr""#;

    c.bench_function("parse_clean_envelope", |b| {
        b.iter(|| ResponseParser::parse_translation_response(black_box(&clean)))
    });

    c.bench_function("parse_wrapped_envelope", |b| {
        b.iter(|| ResponseParser::parse_translation_response(black_box(&wrapped)))
    });

    c.bench_function("parse_repaired_envelope", |b| {
        b.iter(|| ResponseParser::parse_translation_response(black_box(broken)))
    });
}

fn bench_batch_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_sizes");

    for size in [5usize, 20, 100].iter() {
        let items: Vec<String> = (0..*size)
            .map(|i| format!("Translated sentence number {} with some {{placeholder}}", i))
            .collect();
        let raw = format!("Here you go:\n{}", batch_envelope(&items));

        group.bench_with_input(BenchmarkId::new("parse_batch", size), size, |b, &size| {
            b.iter(|| ResponseParser::parse_batch_response(black_box(&raw), size))
        });
    }

    group.finish();
}

fn bench_long_prose(c: &mut Criterion) {
    let prose = "The model rambled on {without} [closing] anything. ".repeat(200);
    let raw = format!("{}{}", prose, translation_envelope("a", "b", "en", "de"));

    c.bench_function("parse_after_long_prose", |b| {
        b.iter(|| ResponseParser::parse_translation_response(black_box(&raw)))
    });
}

criterion_group!(benches, bench_translation_parsing, bench_batch_sizes, bench_long_prose);
criterion_main!(benches);
