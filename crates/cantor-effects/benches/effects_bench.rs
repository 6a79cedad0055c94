//! Criterion benchmarks for the vocal chain stages and sends
//!
//! Run with: cargo bench -p cantor-effects
#![allow(missing_docs)]

use cantor_core::{Effect, StereoSend};
use cantor_effects::{
    Compressor, ConvolutionReverb, FeedbackDelay, HaasWidener, PitchShifter, ToneStack,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const SR: f32 = 48000.0;
const BLOCK_SIZES: [usize; 2] = [128, 1024];

fn test_block(len: usize) -> Vec<f32> {
    (0..len).map(|i| (i as f32 * 0.031).sin() * 0.5).collect()
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("Chain");

    for &size in &BLOCK_SIZES {
        let input = test_block(size);
        let mut output = vec![0.0; size];
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("PitchShifter", size), &size, |b, _| {
            let mut shifter = PitchShifter::new(SR);
            shifter.set_shift(7.0, 1.0);
            b.iter(|| shifter.process_block(black_box(&input), black_box(&mut output)));
        });

        group.bench_with_input(BenchmarkId::new("ToneStack", size), &size, |b, _| {
            let mut tone = ToneStack::new(SR);
            tone.set_gains_db(3.0, -2.0, 4.0);
            tone.set_air(true);
            b.iter(|| tone.process_block(black_box(&input), black_box(&mut output)));
        });

        group.bench_with_input(BenchmarkId::new("Compressor", size), &size, |b, _| {
            let mut comp = Compressor::new(SR);
            b.iter(|| comp.process_block(black_box(&input), black_box(&mut output)));
        });
    }

    group.finish();
}

fn bench_sends(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sends");
    let input = test_block(1024);

    group.bench_function("ConvolutionReverb_1024", |b| {
        let mut reverb = ConvolutionReverb::new(SR);
        reverb.set_mix(0.3);
        reverb.settle();
        b.iter(|| {
            for &x in &input {
                black_box(reverb.process_send(x));
            }
        });
    });

    group.bench_function("FeedbackDelay_1024", |b| {
        let mut echo = FeedbackDelay::new(SR);
        echo.set_mix(0.2);
        b.iter(|| {
            for &x in &input {
                black_box(echo.process_send(x));
            }
        });
    });

    group.bench_function("HaasWidener_1024", |b| {
        let mut widener = HaasWidener::new(SR);
        widener.set_enabled(true);
        b.iter(|| {
            for &x in &input {
                black_box(widener.process_send(x));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_chain, bench_sends);
criterion_main!(benches);
