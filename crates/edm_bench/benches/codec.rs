//! Frame stream benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use edm_bench::{generate_event, EVENT_SIZES};
use edm_codec::{FrameReader, FrameWriter};
use edm_testkit::registry;

/// Benchmark encoding flat frames into a byte stream.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let writer = FrameWriter::new();

    for size in EVENT_SIZES.iter() {
        let data = generate_event(*size)
            .build_frame()
            .unwrap()
            .write_data()
            .unwrap();
        let encoded_len = writer.encode(&data).unwrap().len();
        group.throughput(Throughput::Bytes(encoded_len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let bytes = writer.encode(black_box(data)).unwrap();
                black_box(bytes);
            });
        });
    }
    group.finish();
}

/// Benchmark decoding a byte stream into flat buffers only.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let reader = FrameReader::new();

    for size in EVENT_SIZES.iter() {
        let data = generate_event(*size)
            .build_frame()
            .unwrap()
            .write_data()
            .unwrap();
        let bytes = FrameWriter::new().encode(&data).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| {
                let data = reader.decode(black_box(bytes)).unwrap();
                black_box(data);
            });
        });
    }
    group.finish();
}

/// Benchmark decoding all the way to a resolved frame.
fn bench_read_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_frame");
    let reader = FrameReader::new();
    let registry = registry();

    for size in EVENT_SIZES.iter() {
        let data = generate_event(*size)
            .build_frame()
            .unwrap()
            .write_data()
            .unwrap();
        let bytes = FrameWriter::new().encode(&data).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| {
                let frame = reader
                    .read_frame(black_box(bytes.as_slice()), &registry)
                    .unwrap();
                black_box(frame);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_read_frame);
criterion_main!(benches);
