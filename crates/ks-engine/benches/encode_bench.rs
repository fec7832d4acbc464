//! Benchmarks for patch encoding
//!
//! Run with: cargo bench --bench encode_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ks_engine::{encode, AllFeatures, NecessaryFeatures};
use ks_ir::{Instrument, Patch, Unit, UnitType};

/// 32 single-voice instruments, each a full voice chain with sends and a
/// sample oscillator, close to the encoder's limits.
fn large_patch() -> Patch {
    (0..32u32)
        .map(|i| {
            let id = i * 10 + 1;
            let mut instr = Instrument::new("voice", 1)
                .with_unit(Unit::new(UnitType::Envelope).with("attack", 32).with("gain", 128))
                .with_unit(
                    Unit::new(UnitType::Oscillator)
                        .with_id(id)
                        .with("type", (i % 5) as i32)
                        .with("samplestart", (i % 3) as i32 * 1000),
                )
                .with_unit(Unit::new(UnitType::Mulp))
                .with_unit(Unit::new(UnitType::Filter).with("lowpass", 1))
                .with_unit(Unit::new(UnitType::Delay).with_varargs(vec![1116, 1188, 1276]));
            for _ in 0..8 {
                instr = instr
                    .with_unit(Unit::new(UnitType::Loadval).with("value", 64))
                    .with_unit(Unit::new(UnitType::Send).with("target", id).with("port", 5).with("sendpop", 1));
            }
            instr
                .with_unit(Unit::new(UnitType::Pan))
                .with_unit(Unit::new(UnitType::Out).with("stereo", 1))
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let patch = large_patch();

    group.bench_function("all_features", |b| {
        b.iter(|| encode(black_box(&patch), &AllFeatures).unwrap())
    });

    let features = NecessaryFeatures::for_patch(&patch);
    group.bench_function("necessary_features", |b| {
        b.iter(|| encode(black_box(&patch), &features).unwrap())
    });

    group.bench_function("find_features", |b| {
        b.iter(|| NecessaryFeatures::for_patch(black_box(&patch)))
    });

    group.finish();
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
