//! One-shot contexts that run the full-stream codec of the `lzma-rs` crate
//! over the buffer views. Nothing is kept between calls; these exist for
//! callers that want the same buffer interface without the state reuse.

use crate::error::{check_range, LzmaError};
use crate::options::Options;
use crate::volume::{VolumeReader, VolumeWriter};
use crate::{Compressor, Decompressor};
use lzma_rs::compress::{Options as StreamOptions, UnpackedSize};

fn stream_error(err: lzma_rs::error::Error) -> LzmaError {
    match err {
        lzma_rs::error::Error::IoError(err) => err.into(),
        other => LzmaError::Stream(other.to_string()),
    }
}

pub struct StreamCompressCtx {
    level: u32,
}

impl StreamCompressCtx {
    /// Creates a context for the compression level 'level' (0..=9). The
    /// stream encoder has a single mode, so the level is only validated.
    pub fn new(level: u32) -> Result<Self, LzmaError> {
        Options::with_level(level)?;
        Ok(Self { level })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn compress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, LzmaError> {
        self.compress_at(src, 0, src.len(), dst, 0)
    }

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
        let mut input =
            VolumeReader::wrapped(&src[..src_offset + src_len], src_offset);
        let mut out = VolumeWriter::wrapped(dst, dst_offset);

        let options = StreamOptions {
            unpacked_size: UnpackedSize::WriteToHeader(Some(src_len as u64)),
        };
        lzma_rs::lzma_compress_with_options(&mut input, &mut out, &options)?;
        Ok(out.size() - dst_offset)
    }
}

impl Compressor for StreamCompressCtx {
    fn compress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, LzmaError> {
        StreamCompressCtx::compress(self, src, dst)
    }
}

#[derive(Default)]
pub struct StreamDecompressCtx;

impl StreamDecompressCtx {
    pub fn new() -> Self {
        Self
    }

    pub fn decompress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, LzmaError> {
        self.decompress_at(src, 0, src.len(), dst, 0)
    }

    pub fn decompress_at(
        &mut self,
        src: &[u8],
        src_offset: usize,
        src_len: usize,
        dst: &mut [u8],
        dst_offset: usize,
    ) -> Result<usize, LzmaError> {
        check_range(src_offset, src_len, src.len())?;
        check_range(dst_offset, 0, dst.len())?;
        let mut input =
            VolumeReader::wrapped(&src[..src_offset + src_len], src_offset);
        let mut out = VolumeWriter::wrapped(dst, dst_offset);

        lzma_rs::lzma_decompress(&mut input, &mut out).map_err(stream_error)?;
        Ok(out.size() - dst_offset)
    }
}

impl Decompressor for StreamDecompressCtx {
    fn decompress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, LzmaError> {
        StreamDecompressCtx::decompress(self, src, dst)
    }
}
