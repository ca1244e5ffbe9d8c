//! Flatten and reconstruct benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use edm_bench::{generate_event, EVENT_SIZES};
use edm_testkit::{reread, EventSpec};

/// Benchmark building in-memory collections with relations.
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for size in EVENT_SIZES.iter() {
        let spec = generate_event(*size);
        group.throughput(Throughput::Elements(spec.object_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &spec, |b, spec| {
            b.iter(|| {
                let event = spec.build().unwrap();
                black_box(event);
            });
        });
    }
    group.finish();
}

/// Benchmark flattening every collection of a frame.
fn bench_prepare_for_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare_for_write");

    for size in EVENT_SIZES.iter() {
        let spec = generate_event(*size);
        group.throughput(Throughput::Elements(spec.object_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &spec, |b, spec| {
            let frame = spec.build_frame().unwrap();
            b.iter(|| {
                // write_data hits the cached buffers after the first run.
                let data = frame.write_data().unwrap();
                black_box(data);
            });
        });
    }
    group.finish();
}

/// Benchmark rebuilding and resolving a frame from its flat form.
fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");

    for size in EVENT_SIZES.iter() {
        let spec = generate_event(*size);
        let data = spec.build_frame().unwrap().write_data().unwrap();
        group.throughput(Throughput::Elements(spec.object_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let frame = reread(black_box(data.clone())).unwrap();
                black_box(frame);
            });
        });
    }
    group.finish();
}

/// Benchmark walking every relation of a reconstructed frame.
fn bench_traverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse");

    for size in EVENT_SIZES.iter() {
        let spec = generate_event(*size);
        let frame = reread(spec.build_frame().unwrap().write_data().unwrap()).unwrap();
        group.throughput(Throughput::Elements(spec.object_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| {
                let event = EventSpec::from_frame(black_box(frame)).unwrap();
                black_box(event);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_prepare_for_write,
    bench_reconstruct,
    bench_traverse
);
criterion_main!(benches);
