//! Reusable LZMA1 compression contexts over caller-owned buffers.
//!
//! A [`CompressCtx`] or [`DecompressCtx`] is created once and then called for
//! many independent buffers. Each call reads or writes a self-describing
//! container: a 13-byte header followed by an LZMA1 payload, which is the
//! classic `.lzma` format. The contexts keep their windows and probability
//! tables between calls and only rebuild the parts whose parameters change.

pub mod coding;
pub mod compress;
pub mod decompress;
pub mod error;
pub mod header;
pub mod lz;
pub mod models;
pub mod options;
pub mod stream;
pub mod volume;

pub use compress::{compress_bound, CompressCtx};
pub use decompress::DecompressCtx;
pub use error::LzmaError;
pub use options::Options;
pub use stream::{StreamCompressCtx, StreamDecompressCtx};

pub type Result<T> = std::result::Result<T, LzmaError>;

/// A trait that defines the interface for compressing buffers.
pub trait Compressor {
    /// Compress all of 'src' into the start of 'dst' and return the number
    /// of bytes that were written.
    fn compress(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize>;
}

/// A trait that defines the interface for decompressing buffers.
pub trait Decompressor {
    /// Decompress the container in 'src' into the start of 'dst' and return
    /// the number of bytes that were written.
    fn decompress(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize>;
}
