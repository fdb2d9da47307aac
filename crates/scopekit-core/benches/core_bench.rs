//! Criterion benchmarks for scopekit-core stream primitives
//!
//! Run with: cargo bench -p scopekit-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use scopekit_core::{Sample, WaveformPreamble, stream};

const SAMPLE_RATE: f64 = 1_000_000.0;
const STREAM_SIZES: &[usize] = &[1_000, 10_000, 100_000];

fn sine_stream(size: usize) -> Vec<Sample> {
    let samples: Vec<f64> = (0..size)
        .map(|i| (2.0 * std::f64::consts::PI * 10_000.0 * i as f64 / SAMPLE_RATE).sin())
        .collect();
    stream::from_voltages(&samples, SAMPLE_RATE, 0.0)
}

// ============================================================================
// Interpolation
// ============================================================================

fn bench_voltage_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("VoltageAt");

    for &size in STREAM_SIZES {
        let samples = sine_stream(size);
        let span = samples[size - 1].time;

        group.bench_with_input(BenchmarkId::new("1000_lookups", size), &size, |b, _| {
            b.iter(|| {
                for k in 0..1000 {
                    let t = span * k as f64 / 1000.0;
                    black_box(stream::voltage_at(black_box(&samples), t));
                }
            });
        });
    }

    group.finish();
}

// ============================================================================
// Level crossings
// ============================================================================

fn bench_crossings(c: &mut Criterion) {
    let mut group = c.benchmark_group("RisingCrossings");

    for &size in STREAM_SIZES {
        let samples = sine_stream(size);

        group.bench_with_input(BenchmarkId::new("mid_level", size), &size, |b, _| {
            b.iter(|| black_box(stream::rising_crossings(black_box(&samples), 0.0)));
        });
    }

    group.finish();
}

// ============================================================================
// Preamble scaling
// ============================================================================

fn bench_preamble(c: &mut Criterion) {
    let preamble = WaveformPreamble::parse("0,0,100000,1,1e-06,0,0,0.04,0,127").unwrap();
    let raw: Vec<u8> = (0..100_000).map(|i| (i % 256) as u8).collect();

    c.bench_function("Preamble/to_samples_100000", |b| {
        b.iter(|| black_box(preamble.to_samples(black_box(&raw))));
    });
}

criterion_group!(benches, bench_voltage_at, bench_crossings, bench_preamble);
criterion_main!(benches);
