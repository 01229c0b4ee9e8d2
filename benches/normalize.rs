//! Benchmarks for the pure URL and catalog helpers
//!
//! Measures the non-I/O pieces of a probe run: base-URL normalization,
//! versioned URL construction and model-catalog parsing.
//!
//! Run with: `cargo bench`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use judgeprobe::probe::{EndpointSpec, NormalizationRule, normalize, parse_model_catalog};
use serde_json::json;
use std::hint::black_box;

fn bench_normalize(c: &mut Criterion) {
    let rules = vec![NormalizationRule::tamu_api()];
    let cases = [
        ("tamu_rewrite", "https://chat-api.tamu.ai/v1/"),
        ("no_match", "https://api.openai.com/v1"),
        ("already_normalized", "https://chat-api.tamu.ai/api"),
    ];

    let mut group = c.benchmark_group("normalize");
    for (name, url) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), url, |b, url| {
            b.iter(|| normalize(black_box(url), black_box(&rules)))
        });
    }
    group.finish();
}

fn bench_chat_urls(c: &mut Criterion) {
    let endpoint = EndpointSpec::new("https://chat-api.tamu.ai/v1", &[NormalizationRule::tamu_api()])
        .map(|e| e.with_api_versions(["v1", "v1beta", "v2"]));
    let Ok(endpoint) = endpoint else {
        return;
    };

    c.bench_function("chat_urls_all_versions", |b| {
        b.iter(|| {
            endpoint
                .versions()
                .into_iter()
                .map(|v| endpoint.chat_url(black_box(v)))
                .collect::<Vec<_>>()
        })
    });
}

fn bench_catalog_parsing(c: &mut Criterion) {
    let envelope = json!({
        "object": "list",
        "data": (0..50)
            .map(|i| json!({ "id": format!("protected.model-{}", i), "object": "model" }))
            .collect::<Vec<_>>()
    });
    let bare = json!((0..50).map(|i| format!("model-{}", i)).collect::<Vec<_>>());

    let mut group = c.benchmark_group("parse_model_catalog");
    group.bench_function("openai_envelope", |b| {
        b.iter(|| parse_model_catalog(black_box(&envelope)))
    });
    group.bench_function("bare_strings", |b| {
        b.iter(|| parse_model_catalog(black_box(&bare)))
    });
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_chat_urls, bench_catalog_parsing);
criterion_main!(benches);
