//! Benchmarks for compressing many small records, with and without reusing
//! the contexts.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lzctx::{compress_bound, CompressCtx, DecompressCtx};

fn get_records(count: usize, len: usize) -> Vec<Vec<u8>> {
    let mut v: u32 = 7;
    (0..count)
        .map(|i| {
            (0..len)
                .map(|j| {
                    v = v.wrapping_mul(1103515245).wrapping_add(12345);
                    b"abcdefgh {}:,\n"[((v >> 16) as usize + i + j) % 14]
                })
                .collect()
        })
        .collect()
}

fn compress_reused(records: &[Vec<u8>]) {
    let mut ctx = CompressCtx::new(6).unwrap();
    let mut dst = vec![0; compress_bound(4096)];
    for record in records {
        black_box(ctx.compress(record, &mut dst).unwrap());
    }
}

fn compress_fresh(records: &[Vec<u8>]) {
    let mut dst = vec![0; compress_bound(4096)];
    for record in records {
        let mut ctx = CompressCtx::new(6).unwrap();
        black_box(ctx.compress(record, &mut dst).unwrap());
    }
}

fn decompress_reused(streams: &[Vec<u8>]) {
    let mut dctx = DecompressCtx::new();
    let mut dst = vec![0; 4096];
    for stream in streams {
        black_box(dctx.decompress(stream, &mut dst).unwrap());
    }
}

fn decompress_fresh(streams: &[Vec<u8>]) {
    let mut dst = vec![0; 4096];
    for stream in streams {
        let mut dctx = DecompressCtx::new();
        black_box(dctx.decompress(stream, &mut dst).unwrap());
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let records = get_records(100, 1024);
    let mut ctx = CompressCtx::new(6).unwrap();
    let streams: Vec<Vec<u8>> = records
        .iter()
        .map(|record| {
            let mut dst = vec![0; compress_bound(record.len())];
            let written = ctx.compress(record, &mut dst).unwrap();
            dst.truncate(written);
            dst
        })
        .collect();

    c.bench_function("compress_reused", |b| {
        b.iter(|| compress_reused(&records))
    });
    c.bench_function("compress_fresh", |b| b.iter(|| compress_fresh(&records)));
    c.bench_function("decompress_reused", |b| {
        b.iter(|| decompress_reused(&streams))
    });
    c.bench_function("decompress_fresh", |b| {
        b.iter(|| decompress_fresh(&streams))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
