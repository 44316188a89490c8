#![no_main]

use lzctx::DecompressCtx;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must fail cleanly, never panic.
    let mut dctx = DecompressCtx::new();
    let mut dst = vec![0; 1 << 16];
    let _ = dctx.decompress(data, &mut dst);
});
