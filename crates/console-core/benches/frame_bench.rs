//! Criterion benchmarks for the `/ws/pty` frame codec.
//!
//! Run with:
//! ```bash
//! cargo bench --package console-core --bench frame_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use console_core::protocol::{decode_output, decode_resize, encode_input, encode_resize};
use console_core::OutputPayload;

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// A screenful of typical shell output: coloured `ls` lines.
fn screenful(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("\x1b[34mdir-{i:04}\x1b[0m  file-{i:04}.txt  README.md\r\n"))
        .collect()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_resize(c: &mut Criterion) {
    c.bench_function("encode_resize", |b| {
        b.iter(|| encode_resize(black_box(50), black_box(200)))
    });

    let frame = encode_resize(50, 200);
    c.bench_function("decode_resize", |b| b.iter(|| decode_resize(black_box(&frame))));
}

fn bench_input(c: &mut Criterion) {
    c.bench_function("encode_input_keystroke", |b| {
        b.iter(|| encode_input(black_box(b"a")))
    });
    c.bench_function("encode_input_paste_4k", |b| {
        let paste = "x".repeat(4096);
        b.iter(|| encode_input(black_box(&paste)))
    });
}

fn bench_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_output_text");
    for lines in [1usize, 24, 500] {
        let text = screenful(lines);
        // Skip the escape prefix so the text path (not the raw-bytes path) is measured.
        let printable = text.trim_start_matches("\x1b[34m").to_string();
        let encoded = encode_input(&printable);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &encoded, |b, encoded| {
            b.iter(|| decode_output(OutputPayload::Text(black_box(encoded.clone()))))
        });
    }
    group.finish();

    let raw = screenful(24).into_bytes();
    c.bench_function("decode_output_binary_24_lines", |b| {
        b.iter(|| decode_output(OutputPayload::Binary(black_box(raw.clone()))))
    });
}

criterion_group!(benches, bench_resize, bench_input, bench_output);
criterion_main!(benches);
