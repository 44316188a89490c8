//! A compression context that keeps its encoder state between calls.
//!
//! Every call produces an independent LZMA1 container (header and payload).
//! The window, the hash tables and the probability tables are allocated on
//! first use and then reset, not rebuilt, for the following calls.

use crate::coding::encoder::LzmaEncoder;
use crate::coding::range::RangeEncoder;
use crate::error::{check_range, LzmaError};
use crate::header::{Header, HEADER_SIZE, UNCOMPRESSED_SIZE_MAX};
use crate::lz::window::LzWindow;
use crate::options::Options;
use crate::volume::VolumeWriter;
use crate::Compressor;

/// Returns a destination size that fits the compressed form of 'len' bytes
/// of practical input. Incompressible input grows by a little over 1/64 in
/// LZMA, so this leaves generous slack.
pub fn compress_bound(len: usize) -> usize {
    HEADER_SIZE + len + len / 4 + 64
}

pub struct CompressCtx {
    options: Options,
    lz: LzWindow,
    lzma: LzmaEncoder,
    rc: RangeEncoder,
}

impl CompressCtx {
    /// Creates a context with the preset for 'level' (0..=9).
    pub fn new(level: u32) -> Result<Self, LzmaError> {
        Self::with_options(Options::with_level(level)?)
    }

    pub fn with_options(options: Options) -> Result<Self, LzmaError> {
        options.validate()?;
        log::debug!(
            "Creating a compression context: props={} dict_size={}",
            options.props.to_byte(),
            options.dict_size
        );
        Ok(Self {
            options,
            lz: LzWindow::new(options.dict_size as usize),
            lzma: LzmaEncoder::new(&options),
            rc: RangeEncoder::new(),
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Compresses 'src' into the start of 'dst' and returns the number of
    /// bytes written.
    pub fn compress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, LzmaError> {
        self.compress_at(src, 0, src.len(), dst, 0)
    }

    /// Compresses 'src_len' bytes of 'src' starting at 'src_offset' into
    /// 'dst' starting at 'dst_offset'. Returns the number of bytes written.
    pub fn compress_at(
        &mut self,
        src: &[u8],
        src_offset: usize,
        src_len: usize,
        dst: &mut [u8],
        dst_offset: usize,
    ) -> Result<usize, LzmaError> {
        check_range(src_offset, src_len, src.len())?;
        check_range(dst_offset, 0, dst.len())?;
        if src_len as u64 > UNCOMPRESSED_SIZE_MAX {
            return Err(LzmaError::PayloadTooLarge {
                size: src_len as u64,
                limit: UNCOMPRESSED_SIZE_MAX,
            });
        }
        log::trace!("Compressing {} bytes", src_len);

        let mut out = VolumeWriter::wrapped(dst, dst_offset);
        let src = &src[src_offset..src_offset + src_len];
        let res = self.encode(src, &mut out);

        // Leave the context ready for the next call, even after a failure.
        self.rc.reset();
        self.lzma.reset();
        self.lz.reset();

        res?;
        Ok(out.size() - dst_offset)
    }

    fn encode(
        &mut self,
        src: &[u8],
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let header = Header {
            props: self.options.props,
            dict_size: self.options.dict_size,
            uncompressed_size: if self.options.end_marker {
                None
            } else {
                Some(src.len() as u64)
            },
        };
        header.write(out)?;

        let mut rest = src;
        while !rest.is_empty() {
            let used = self.lz.fill_window(rest);
            rest = &rest[used..];
            self.lzma.encode_step(&mut self.lz, &mut self.rc, out)?;
        }

        self.lz.set_finishing();
        self.lzma.encode_step(&mut self.lz, &mut self.rc, out)?;
        if self.options.end_marker {
            self.lzma.encode_end_marker(&self.lz, &mut self.rc, out)?;
        }
        self.rc.finish(out)
    }
}

impl Compressor for CompressCtx {
    fn compress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, LzmaError> {
        CompressCtx::compress(self, src, dst)
    }
}

#[test]
fn test_header_is_written_first() {
    let mut ctx = CompressCtx::new(3).unwrap();
    let mut dst = vec![0u8; compress_bound(5)];
    let written = ctx.compress(b"hello", &mut dst).unwrap();
    assert!(written > HEADER_SIZE);
    let expected = [93, 0, 0, 0x40, 0, 5, 0, 0, 0, 0, 0, 0, 0];
    assert_eq!(&dst[..HEADER_SIZE], &expected);
    // The first byte of the range coder output is always zero.
    assert_eq!(dst[HEADER_SIZE], 0);
}

#[test]
fn test_overflow_does_not_poison_the_context() {
    let mut ctx = CompressCtx::new(1).unwrap();
    let input = b"some input that will not fit into a tiny destination";
    let mut small = [0u8; 16];
    assert!(matches!(
        ctx.compress(input, &mut small),
        Err(LzmaError::BufferOverflow { .. })
    ));

    let mut fresh = CompressCtx::new(1).unwrap();
    let mut a = vec![0u8; compress_bound(input.len())];
    let mut b = vec![0u8; compress_bound(input.len())];
    let len_a = ctx.compress(input, &mut a).unwrap();
    let len_b = fresh.compress(input, &mut b).unwrap();
    assert_eq!(a[..len_a], b[..len_b]);
}
