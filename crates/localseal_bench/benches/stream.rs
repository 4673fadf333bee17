//! Stream encryption benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use localseal_bench::{random_data, warm_codec, LEGACY_LEVEL, MODERN_LEVEL};
use localseal_core::Config;
use std::io::{Read, Write};

/// Benchmark sealing whole payloads per tier.
fn bench_encrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("encrypt");

    for (tier, level) in [("legacy", LEGACY_LEVEL), ("modern", MODERN_LEVEL)] {
        let codec = warm_codec(level, Config::default());
        for size in [64, 1024, 16 * 1024, 256 * 1024] {
            let data = random_data(size);
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(tier, size), &data, |b, data| {
                b.iter(|| black_box(codec.encrypt_to_vec(black_box(data)).unwrap()));
            });
        }
    }

    group.finish();
}

/// Benchmark opening whole payloads per tier.
fn bench_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("decrypt");

    for (tier, level) in [("legacy", LEGACY_LEVEL), ("modern", MODERN_LEVEL)] {
        let codec = warm_codec(level, Config::default());
        for size in [64, 1024, 16 * 1024, 256 * 1024] {
            let sealed = codec.encrypt_to_vec(&random_data(size)).unwrap();
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(tier, size), &sealed, |b, sealed| {
                b.iter(|| black_box(codec.decrypt_slice(black_box(sealed)).unwrap()));
            });
        }
    }

    group.finish();
}

/// Benchmark AES-128 against AES-256 content keys.
fn bench_key_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_size");
    let size = 64 * 1024;
    let data = random_data(size);
    group.throughput(Throughput::Bytes(size as u64));

    for bits in [128u32, 256] {
        let codec = warm_codec(MODERN_LEVEL, Config::default().key_size_bits(bits));
        group.bench_with_input(BenchmarkId::from_parameter(bits), &data, |b, data| {
            b.iter(|| {
                let sealed = codec.encrypt_to_vec(data).unwrap();
                black_box(codec.decrypt_slice(&sealed).unwrap())
            });
        });
    }

    group.finish();
}

/// Benchmark writing through the stream adapter in small chunks.
fn bench_chunked_streams(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked_stream");
    let size = 64 * 1024;
    let data = random_data(size);
    let codec = warm_codec(MODERN_LEVEL, Config::default());
    group.throughput(Throughput::Bytes(size as u64));

    for chunk in [512usize, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &data, |b, data| {
            b.iter(|| {
                let mut stream = codec.wrap_encrypt(Vec::with_capacity(size + 32)).unwrap();
                for piece in data.chunks(chunk) {
                    stream.write_all(piece).unwrap();
                }
                let sealed = stream.finish().unwrap();

                let mut reader = codec.wrap_decrypt(sealed.as_slice()).unwrap();
                let mut buf = vec![0u8; chunk];
                let mut total = 0;
                loop {
                    let n = reader.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    total += n;
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encrypt,
    bench_decrypt,
    bench_key_sizes,
    bench_chunked_streams,
);

criterion_main!(benches);
