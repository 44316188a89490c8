use lzctx::header::{
    Properties, DICT_SIZE_MAX, DICT_SIZE_MIN, HEADER_SIZE,
    UNCOMPRESSED_SIZE_MAX, UNKNOWN_SIZE,
};
use lzctx::{compress_bound, CompressCtx, DecompressCtx, LzmaError, Options};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn get_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * i / 7) % 61) as u8 + b' ').collect()
}

fn compress_with(options: Options, input: &[u8]) -> Vec<u8> {
    let mut ctx = CompressCtx::with_options(options).unwrap();
    let mut compressed = vec![0; compress_bound(input.len())];
    let written = ctx.compress(input, &mut compressed).unwrap();
    compressed.truncate(written);
    compressed
}

fn compress(level: u32, input: &[u8]) -> Vec<u8> {
    compress_with(Options::with_level(level).unwrap(), input)
}

fn header(props: u8, dict_size: u32, size: u64) -> Vec<u8> {
    let mut buf = vec![props];
    buf.extend_from_slice(&dict_size.to_le_bytes());
    buf.extend_from_slice(&size.to_le_bytes());
    buf
}

#[test]
fn test_zero_size_consumes_only_the_header() {
    let mut input = header(93, 1 << 20, 0);
    // Garbage after the header is never looked at.
    input.extend_from_slice(&[0xff; 7]);
    let mut dctx = DecompressCtx::new();
    let mut dst = [0u8; 4];
    assert_eq!(dctx.decompress(&input, &mut dst), Ok(0));
    assert_eq!(dctx.consumed(), HEADER_SIZE);
    assert_eq!(dctx.last_properties(), None);
    assert_eq!(dctx.decompress(&input, &mut []), Ok(0));
}

#[test]
fn test_destination_must_fit_the_payload() {
    let input = get_data(5_000);
    let compressed = compress(2, &input);
    let mut dctx = DecompressCtx::new();

    let mut small = vec![0; input.len() - 1];
    assert_eq!(
        dctx.decompress(&compressed, &mut small),
        Err(LzmaError::PayloadTooLarge {
            size: input.len() as u64,
            limit: input.len() as u64 - 1,
        })
    );

    let mut exact = vec![0; input.len()];
    assert_eq!(dctx.decompress(&compressed, &mut exact), Ok(input.len()));
    assert_eq!(exact, input);
}

#[test]
fn test_header_errors() {
    let mut dctx = DecompressCtx::new();
    let mut dst = [0u8; 64];

    let res = dctx.decompress(&header(225, 1 << 20, 10), &mut dst);
    assert_eq!(res, Err(LzmaError::InvalidPropertiesByte(225)));

    let res = dctx.decompress(&header(93, 0x7fff_fff1, 10), &mut dst);
    assert_eq!(res, Err(LzmaError::UnsupportedDictionarySize(0x7fff_fff1)));

    let too_big = header(93, 1 << 20, UNCOMPRESSED_SIZE_MAX + 1);
    let res = dctx.decompress(&too_big, &mut dst);
    assert!(matches!(res, Err(LzmaError::PayloadTooLarge { .. })));

    let res = dctx.decompress(&header(93, 1 << 20, 10)[..9], &mut dst);
    assert_eq!(res, Err(LzmaError::UnexpectedEof));

    // The payload must start with a zero byte.
    let mut input = header(93, 1 << 20, 10);
    input.extend_from_slice(&[1, 0, 0, 0, 0]);
    let res = dctx.decompress(&input, &mut dst);
    assert_eq!(res, Err(LzmaError::CorruptedPayload));

    // A failed call does not register its parameters.
    assert_eq!(dctx.last_properties(), None);
    assert_eq!(dctx.last_dict_size(), None);
}

#[test]
fn test_truncated_payload() {
    let input = get_data(10_000);
    let compressed = compress(4, &input);
    let mut dctx = DecompressCtx::new();
    let mut dst = vec![0; input.len()];
    let res = dctx.decompress(&compressed[..compressed.len() / 2], &mut dst);
    assert_eq!(res, Err(LzmaError::UnexpectedEof));
}

#[test]
fn test_rebuilds_only_what_changed() {
    let small = get_data(1_000);
    let large = get_data(100_000);
    let mut dctx = DecompressCtx::new();
    let mut dst = vec![0; large.len()];

    let mut check = |compressed: &[u8], expected: &[u8], window, model| {
        let len = dctx.decompress(compressed, &mut dst).unwrap();
        assert_eq!(&dst[..len], expected);
        let counts = dctx.rebuilds();
        assert_eq!((counts.window, counts.model), (window, model));
    };

    // The dictionary is clamped to the payload size.
    check(&compress(6, &small), &small, 1, 1);
    check(&compress(0, &small), &small, 1, 1);
    check(&compress(6, &large), &large, 2, 1);
    check(&compress(6, &large), &large, 2, 1);

    let mut options = Options::with_level(6).unwrap();
    options.props = Properties::new(0, 2, 0).unwrap();
    check(&compress_with(options, &large), &large, 2, 2);
    check(&compress(6, &large), &large, 2, 3);
    check(&compress(6, &small), &small, 3, 3);
    assert_eq!(dctx.last_properties(), Some(93));
    assert_eq!(dctx.last_dict_size(), Some(4096));
}

#[test]
fn test_failed_call_does_not_poison_the_context() {
    let input = get_data(3_000);
    let compressed = compress(3, &input);
    let mut dctx = DecompressCtx::new();
    let mut dst = vec![0; input.len()];

    let mut broken = compressed.clone();
    broken.truncate(HEADER_SIZE + 10);
    assert!(dctx.decompress(&broken, &mut dst).is_err());

    assert_eq!(dctx.decompress(&compressed, &mut dst), Ok(input.len()));
    assert_eq!(dst, input);
}

#[test]
fn test_failed_resize_keeps_the_window() {
    let input = get_data(100_000);
    let compressed = compress(6, &input);
    let mut dctx = DecompressCtx::new();
    let mut dst = vec![0; input.len()];
    assert_eq!(dctx.decompress(&compressed, &mut dst), Ok(input.len()));

    // A smaller window is requested, but the payload is rejected.
    let mut broken = header(93, 1 << 20, 1_000);
    broken.extend_from_slice(&[1, 0, 0, 0, 0]);
    let res = dctx.decompress(&broken, &mut dst);
    assert_eq!(res, Err(LzmaError::CorruptedPayload));
    assert_eq!(dctx.last_dict_size(), Some(100_000));

    dst.fill(0);
    assert_eq!(dctx.decompress(&compressed, &mut dst), Ok(input.len()));
    assert_eq!(dst, input);
    assert_eq!(dctx.rebuilds().window, 1);
}

#[test]
fn test_unknown_size_window_is_bounded_by_the_destination() {
    let mut input = header(93, DICT_SIZE_MAX, UNKNOWN_SIZE);
    input.extend_from_slice(&[0; 8]);
    let mut dctx = DecompressCtx::new();
    let mut dst = [0u8; 16];
    let _ = dctx.decompress(&input, &mut dst);
    assert_eq!(dctx.last_dict_size(), Some(DICT_SIZE_MIN));
}

#[test]
fn test_corruption_is_detected() {
    let input = get_data(20_000);
    let compressed = compress(5, &input);
    let mut dctx = DecompressCtx::new();
    let mut dst = vec![0; input.len()];
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let mut detected = 0;
    let trials = 200;
    for _ in 0..trials {
        let mut broken = compressed.clone();
        let pos = rng.gen_range(HEADER_SIZE + 1..broken.len());
        broken[pos] ^= 1 << rng.gen_range(0..8);
        match dctx.decompress(&broken, &mut dst) {
            Err(LzmaError::CorruptedPayload)
            | Err(LzmaError::UnexpectedEof) => detected += 1,
            Err(err) => panic!("Unexpected error {:?}", err),
            Ok(_) => {}
        }
    }
    // LZMA has no checksum, so a flip may go unnoticed, but rarely.
    assert!(detected * 10 >= trials * 9, "Detected {} of {}", detected, trials);
}

#[test]
fn test_end_marker_stream() {
    let input = get_data(50_000);
    let mut options = Options::with_level(3).unwrap();
    options.end_marker = true;
    let compressed = compress_with(options, &input);
    assert_eq!(&compressed[5..13], &[0xff; 8]);

    let mut dctx = DecompressCtx::new();
    let mut dst = vec![0; input.len() + 100];
    let len = dctx.decompress(&compressed, &mut dst).unwrap();
    assert_eq!(len, input.len());
    assert_eq!(&dst[..len], &input[..]);
    assert_eq!(dctx.consumed(), compressed.len());

    // Without a declared size, a short destination returns what fits.
    let mut short = vec![0; 1_000];
    assert_eq!(dctx.decompress(&compressed, &mut short), Ok(1_000));
    assert_eq!(&short[..], &input[..1_000]);

    // An empty stream is just the marker.
    let compressed = compress_with(options, &[]);
    assert_eq!(dctx.decompress(&compressed, &mut dst), Ok(0));
}
