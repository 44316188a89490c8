#![no_main]

use lzctx::{compress_bound, CompressCtx, DecompressCtx};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let level = data.first().map_or(0, |b| (b % 10) as u32);
    let mut ctx = CompressCtx::new(level).unwrap();
    let mut compressed = vec![0; compress_bound(data.len())];
    let written = ctx.compress(data, &mut compressed).unwrap();

    let mut dctx = DecompressCtx::new();
    let mut decompressed = vec![0; data.len()];
    let len = dctx
        .decompress(&compressed[..written], &mut decompressed)
        .unwrap();
    assert_eq!(len, data.len());
    assert_eq!(dctx.consumed(), written);
    assert_eq!(decompressed, data);
});
