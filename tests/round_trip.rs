use lzctx::header::HEADER_SIZE;
use lzctx::{compress_bound, CompressCtx, DecompressCtx, Options};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Generates 'len' bytes of text-like data with plenty of repetition.
fn get_text(len: usize, seed: u64) -> Vec<u8> {
    let words: [&[u8]; 8] = [
        b"lorem ", b"ipsum ", b"dolor ", b"sit ", b"amet, ", b"column ",
        b"record ", b"\n",
    ];
    let mut state = seed;
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.extend_from_slice(words[(state >> 61) as usize]);
    }
    out.truncate(len);
    out
}

fn get_random(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let dist = Uniform::new_inclusive(0u8, 255);
    (0..len).map(|_| dist.sample(&mut rng)).collect()
}

fn compress(ctx: &mut CompressCtx, input: &[u8]) -> Vec<u8> {
    let mut compressed = vec![0; compress_bound(input.len())];
    let written = ctx.compress(input, &mut compressed).unwrap();
    compressed.truncate(written);
    compressed
}

#[track_caller]
fn round_trip(ctx: &mut CompressCtx, dctx: &mut DecompressCtx, input: &[u8]) {
    let compressed = compress(ctx, input);
    let mut decompressed = vec![0; input.len()];
    let written = dctx.decompress(&compressed, &mut decompressed).unwrap();
    assert_eq!(written, input.len());
    // An empty payload is recognized from the header alone.
    let consumed = if input.is_empty() {
        HEADER_SIZE
    } else {
        compressed.len()
    };
    assert_eq!(dctx.consumed(), consumed);
    assert_eq!(decompressed, input);
}

#[test]
fn test_round_trip_simple() {
    let mut ctx = CompressCtx::new(6).unwrap();
    let mut dctx = DecompressCtx::new();
    round_trip(&mut ctx, &mut dctx, &[]);
    round_trip(&mut ctx, &mut dctx, &[0]);
    round_trip(&mut ctx, &mut dctx, &[0, 0, 0, 0]);
    round_trip(&mut ctx, &mut dctx, &[0, 0, 1, 1, 2, 3]);
    round_trip(&mut ctx, &mut dctx, &[1, 251, 255, 0, 245, 32, 32, 142]);
    round_trip(&mut ctx, &mut dctx, &[254, 254, 254, 0, 0]);
    round_trip(&mut ctx, &mut dctx, &[7; 1000]);
    round_trip(
        &mut ctx,
        &mut dctx,
        &[
            254, 254, 254, 0, 0, 1, 251, 255, 0, 245, 32, 32, 142, 1, 251,
            255, 0, 245, 32, 32, 142, 38, 10, 223, 223, 102, 38, 10, 223, 223,
            102, 99, 99,
        ],
    );
}

#[test]
fn test_round_trip_all_levels() {
    let text = get_text(100_000, 7);
    let random = get_random(20_000);
    let mut dctx = DecompressCtx::new();
    for level in 0..=9 {
        let mut ctx = CompressCtx::new(level).unwrap();
        round_trip(&mut ctx, &mut dctx, &text);
        round_trip(&mut ctx, &mut dctx, &random);
        round_trip(&mut ctx, &mut dctx, &text[..1]);
        round_trip(&mut ctx, &mut dctx, &text[..300]);
    }
}

#[test]
fn test_text_compresses() {
    let text = get_text(100_000, 11);
    let mut ctx = CompressCtx::new(6).unwrap();
    let compressed = compress(&mut ctx, &text);
    assert!(compressed.len() < text.len() / 4);
}

#[test]
fn test_quick_brown_fox() {
    let text = b"THE QUICK BROWN FOX JUMPS OVER THE LAZY DOG";
    let mut ctx = CompressCtx::new(3).unwrap();
    let compressed = compress(&mut ctx, text);
    assert_eq!(compressed[0], 93);
    assert_eq!(&compressed[1..5], &(4u32 << 20).to_le_bytes());
    assert_eq!(&compressed[5..13], &(text.len() as u64).to_le_bytes());

    let mut dctx = DecompressCtx::new();
    let mut decompressed = vec![0; text.len()];
    let written = dctx.decompress(&compressed, &mut decompressed).unwrap();
    assert_eq!(written, text.len());
    assert_eq!(&decompressed[..], &text[..]);
}

#[test]
fn test_context_reuse_matches_fresh_context() {
    let inputs = [
        get_text(5_000, 1),
        get_random(3_000),
        get_text(70_000, 2),
        Vec::new(),
        get_text(5_000, 1),
    ];
    let mut reused = CompressCtx::new(5).unwrap();
    for input in inputs.iter() {
        let mut fresh = CompressCtx::new(5).unwrap();
        assert_eq!(compress(&mut reused, input), compress(&mut fresh, input));
    }
}

#[test]
fn test_header_is_deterministic() {
    let input = get_text(1_000, 3);
    let mut a = CompressCtx::new(2).unwrap();
    let mut b = CompressCtx::new(2).unwrap();
    let first = compress(&mut a, &input);
    let second = compress(&mut b, &input);
    assert_eq!(first[..HEADER_SIZE], second[..HEADER_SIZE]);
    assert_eq!(first, second);
}

#[test]
fn test_large_input_slides_the_window() {
    // The smallest dictionary, so the window slides many times.
    let mut options = Options::with_level(1).unwrap();
    options.dict_size = 1 << 12;
    let mut ctx = CompressCtx::with_options(options).unwrap();
    let mut dctx = DecompressCtx::new();
    let mut input = get_text(300_000, 5);
    input.extend(get_random(10_000));
    input.extend(get_text(300_000, 6));
    round_trip(&mut ctx, &mut dctx, &input);
}

#[test]
fn test_many_small_records() {
    let mut ctx = CompressCtx::new(4).unwrap();
    let mut dctx = DecompressCtx::new();
    let mut rng = rand::thread_rng();
    for i in 0..200 {
        let len = rng.gen_range(0..600);
        let record = get_text(len, i);
        round_trip(&mut ctx, &mut dctx, &record);
    }
    // Every record was shorter than the minimum dictionary, so the decoder
    // state was built once.
    assert_eq!(dctx.rebuilds().window, 1);
    assert_eq!(dctx.rebuilds().model, 1);
}

#[test]
fn test_custom_properties() {
    let mut dctx = DecompressCtx::new();
    let input = get_text(20_000, 9);
    for (lc, lp, pb) in [(0, 0, 0), (8, 4, 4), (1, 2, 3), (4, 0, 2)] {
        let mut options = Options::with_level(3).unwrap();
        options.props = lzctx::header::Properties::new(lc, lp, pb).unwrap();
        let mut ctx = CompressCtx::with_options(options).unwrap();
        round_trip(&mut ctx, &mut dctx, &input);
    }
}

#[test]
fn test_offsets() {
    let input = get_text(2_000, 4);
    let mut ctx = CompressCtx::new(3).unwrap();
    let mut dctx = DecompressCtx::new();

    let mut compressed = vec![0xaa; 10 + compress_bound(1_000)];
    let written = ctx
        .compress_at(&input, 500, 1_000, &mut compressed, 10)
        .unwrap();
    assert!(compressed[..10].iter().all(|&b| b == 0xaa));

    let mut decompressed = vec![0; 1_020];
    let len = dctx
        .decompress_at(&compressed, 10, written, &mut decompressed, 20)
        .unwrap();
    assert_eq!(len, 1_000);
    assert_eq!(&decompressed[20..], &input[500..1_500]);

    assert!(ctx.compress_at(&input, 1_500, 1_000, &mut compressed, 0).is_err());
}
