//! Benchmark for the match finder of the encoder window.

fn get_large_array(items: usize) -> Vec<u8> {
    let mut input = Vec::new();
    let mut v = 0;
    for i in 0..items {
        v += 3;
        input.push((i ^ v) as u8);
    }
    input
}

fn scan(input: &[u8], depth: usize) {
    let mut window = LzWindow::new(1 << 20);
    let mut rest = input;
    let mut found = 0;
    loop {
        let used = window.fill_window(rest);
        rest = &rest[used..];
        if rest.is_empty() {
            window.set_finishing();
        }
        while window.has_enough_data() {
            let len = match window.find_match(0, 273, depth) {
                Some((len, _)) => len,
                None => 1,
            };
            found += len;
            window.advance(len.min(window.avail()));
        }
        if rest.is_empty() {
            break;
        }
    }
    black_box(found);
}

fn match_large_buffer() {
    let input = get_large_array(1_000_000);
    scan(&input, 16);
}

fn match_small_buffer() {
    let input = get_large_array(1_000);
    scan(&input, 16);
}

fn match_deep_search() {
    let input = get_large_array(100_000);
    scan(&input, 512);
}

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lzctx::lz::window::LzWindow;

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("match_small_buffer", |b| b.iter(match_small_buffer));
    c.bench_function("match_large_buffer", |b| b.iter(match_large_buffer));
    c.bench_function("match_deep_search", |b| b.iter(match_deep_search));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
