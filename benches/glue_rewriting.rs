//! Glue Rewriting Benchmarks
//!
//! **Purpose:** Measure the text transformations applied to generated glue
//!
//! **Regression Threshold:** >20% slower than baseline
//!
//! **How to Run:**
//! ```bash
//! cargo bench --bench glue_rewriting
//! ```
//!
//! **What's Being Measured:**
//! 1. `scan exports` - Lexing an internal module for public declarations
//! 2. `encode payload` / `decode payload` - Wrapped base64 of a 256 KiB module
//! 3. `parse config` - TOML parsing plus validation
//!
//! **Performance Notes:**
//! - The export scanner is a single pass over bytes; strings, comments,
//!   templates and regex literals are skipped without allocation

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use wasm_inline_slim::config::ConfigLoader;
use wasm_inline_slim::glue::{decode_wrapped, encode_wrapped, scan_exports};

/// Internal module shaped like generator output, with `count` export blocks
fn internal_module(count: usize) -> String {
    let mut source = String::new();
    for i in 0..count {
        source.push_str(&format!(
            "/**\n * Compress block {i}\n */\nexport function compress{i}(input) {{\n  \
             const re = /[a-z]+\\/{{2}}/g;\n  return `${{input}}-${{\"}}\"}}`;\n}}\n\
             export const _ptr{i} = {i};\nexport class Stream{i} {{\n  \
             push(chunk) {{ return chunk.length / 2; }}\n}}\n"
        ));
    }
    source
}

fn bench_scan_exports(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan exports");
    for count in [10usize, 100, 1000] {
        let source = internal_module(count);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &source, |b, source| {
            b.iter(|| black_box(scan_exports(black_box(source))));
        });
    }
    group.finish();
}

fn bench_payload_codec(c: &mut Criterion) {
    let bytes: Vec<u8> = (0..256 * 1024u32).map(|i| (i * 31 % 256) as u8).collect();
    let encoded = encode_wrapped(&bytes);

    let mut group = c.benchmark_group("payload");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode payload", |b| {
        b.iter(|| black_box(encode_wrapped(black_box(&bytes))));
    });
    group.bench_function("decode payload", |b| {
        b.iter(|| black_box(decode_wrapped(black_box(&encoded))).unwrap());
    });
    group.finish();
}

fn bench_parse_config(c: &mut Criterion) {
    let contents = r#"
[generator]
program = "deno"
out-dir = "lib"
module = "lz4"

[wasm-opt]
version = "version_121"
opt-level = "-Oz"
flags = ["--strip-debug", "--strip-producers"]
max-retries = 3

[cache]
namespace = "wasm-inline-slim"
"#;

    c.bench_function("parse config", |b| {
        b.iter(|| black_box(ConfigLoader::parse(black_box(contents))).unwrap());
    });
}

criterion_group!(
    benches,
    bench_scan_exports,
    bench_payload_codec,
    bench_parse_config
);
criterion_main!(benches);
