//! Criterion benchmarks for the oscillator bank and the feedback delay.
//!
//! Run with: cargo bench -p musigen-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use musigen_core::delay::FeedbackDelay;
use musigen_core::osc::{self, BlockClock, FmParams, VOLUME};
use musigen_core::wavetable::Wavetable;

const SAMPLE_RATE: f64 = 44_100.0;
const BLOCK_SIZES: &[usize] = &[256, 512, 1024, 2048];

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("OscillatorBank");
    let table = Wavetable::sine_saw();

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0_f32; size];
        let mut clock = BlockClock::new(0, SAMPLE_RATE);

        group.bench_with_input(BenchmarkId::new("Sine", size), &size, |b, &n| {
            b.iter(|| {
                osc::sine(&mut out, clock, 440.0, VOLUME);
                clock = clock.advance(n);
                black_box(out[n - 1])
            })
        });
        group.bench_with_input(BenchmarkId::new("FM", size), &size, |b, &n| {
            b.iter(|| {
                osc::fm(&mut out, clock, FmParams::default(), VOLUME);
                clock = clock.advance(n);
                black_box(out[n - 1])
            })
        });
        group.bench_with_input(BenchmarkId::new("Wavetable", size), &size, |b, &n| {
            b.iter(|| {
                osc::wavetable(&mut out, clock, 440.0, &table, VOLUME);
                clock = clock.advance(n);
                black_box(out[n - 1])
            })
        });
    }
    group.finish();
}

fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("FeedbackDelay");

    for &size in BLOCK_SIZES {
        let mut delay = FeedbackDelay::with_time(SAMPLE_RATE as f32, 0.5, 0.5).unwrap();
        let mut block = vec![0.25_f32; size];

        group.bench_with_input(BenchmarkId::new("process_in_place", size), &size, |b, _| {
            b.iter(|| {
                delay.process_in_place(black_box(&mut block)).unwrap();
                black_box(block[0])
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generators, bench_delay);
criterion_main!(benches);
