use lzctx::{
    compress_bound, CompressCtx, Compressor, DecompressCtx, Decompressor,
    LzmaError, Options, StreamCompressCtx, StreamDecompressCtx,
};
use rand_distr::{Distribution, Uniform};

fn get_input(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let letters = Uniform::new_inclusive(b'a', b'f');
    (0..len).map(|_| letters.sample(&mut rng)).collect()
}

#[track_caller]
fn cross_check(
    compressor: &mut dyn Compressor,
    decompressor: &mut dyn Decompressor,
    input: &[u8],
) {
    let mut compressed = vec![0; compress_bound(input.len())];
    let written = compressor.compress(input, &mut compressed).unwrap();
    let mut decompressed = vec![0; input.len()];
    let len = decompressor
        .decompress(&compressed[..written], &mut decompressed)
        .unwrap();
    assert_eq!(len, input.len());
    assert_eq!(decompressed, input);
}

#[test]
fn test_stream_decoder_reads_context_output() {
    let input = get_input(30_000);
    for level in [0, 3, 6, 9] {
        let mut ctx = CompressCtx::new(level).unwrap();
        let mut stream = StreamDecompressCtx::new();
        cross_check(&mut ctx, &mut stream, &input);
        cross_check(&mut ctx, &mut stream, &input[..10]);
    }
}

#[test]
fn test_context_reads_stream_output() {
    let input = get_input(30_000);
    let mut stream = StreamCompressCtx::new(6).unwrap();
    let mut dctx = DecompressCtx::new();
    cross_check(&mut stream, &mut dctx, &input);
    cross_check(&mut stream, &mut dctx, &input[..1]);
}

#[test]
fn test_stream_round_trip() {
    let input = get_input(10_000);
    let mut stream = StreamCompressCtx::new(1).unwrap();
    let mut dstream = StreamDecompressCtx::new();
    cross_check(&mut stream, &mut dstream, &input);
    cross_check(&mut stream, &mut dstream, &[]);
}

#[test]
fn test_stream_decoder_reads_end_marker() {
    let input = get_input(5_000);
    let mut options = Options::with_level(2).unwrap();
    options.end_marker = true;
    let mut ctx = CompressCtx::with_options(options).unwrap();
    cross_check(&mut ctx, &mut StreamDecompressCtx::new(), &input);
}

#[test]
fn test_stream_overflow() {
    let input = get_input(1_000);
    let mut stream = StreamCompressCtx::new(3).unwrap();
    let mut small = [0u8; 100];
    assert!(matches!(
        stream.compress(&input, &mut small),
        Err(LzmaError::BufferOverflow { .. })
    ));

    let mut ctx = CompressCtx::new(3).unwrap();
    let mut compressed = vec![0; compress_bound(input.len())];
    let written = ctx.compress(&input, &mut compressed).unwrap();
    let mut dst = [0u8; 100];
    let mut dstream = StreamDecompressCtx::new();
    let res = dstream.decompress(&compressed[..written], &mut dst);
    assert!(res.is_err());
}

#[test]
fn test_invalid_level() {
    assert_eq!(CompressCtx::new(10).err(), Some(LzmaError::InvalidLevel(10)));
    assert_eq!(
        StreamCompressCtx::new(42).err(),
        Some(LzmaError::InvalidLevel(42))
    );
}
