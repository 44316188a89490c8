//! A decompression context that keeps its decoder state between calls.
//!
//! Each call parses a container header and compares its parameters with those
//! of the previous call. The window is only reallocated when the dictionary
//! size changes, and the model only when the properties byte changes;
//! otherwise both are reset in place.

use crate::coding::decoder::LzmaDecoder;
use crate::coding::range::RangeDecoder;
use crate::error::{check_range, LzmaError};
use crate::header::{normalize_dict_size, Header, Properties};
use crate::lz::dict::LzDict;
use crate::volume::VolumeReader;
use crate::Decompressor;

/// Counts how often the decoder state had to be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildCounts {
    /// Window allocations, including the first one.
    pub window: u64,
    /// Model allocations, including the first one.
    pub model: u64,
}

/// The decoder state that survives between calls.
struct Codec {
    lz: LzDict,
    rc: RangeDecoder,
    lzma: LzmaDecoder,
}

#[derive(Default)]
pub struct DecompressCtx {
    /// The decoder state, built by the first call that needs it.
    codec: Option<Codec>,
    /// The properties byte the model was built for.
    last_props: Option<u8>,
    /// The dictionary size the window was built for.
    last_dict_size: Option<u32>,
    /// Input bytes consumed by the last call.
    consumed: usize,
    rebuilds: RebuildCounts,
}

impl DecompressCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the properties byte of the current model, if any.
    pub fn last_properties(&self) -> Option<u8> {
        self.last_props
    }

    /// Returns the size of the current window, if any.
    pub fn last_dict_size(&self) -> Option<u32> {
        self.last_dict_size
    }

    pub fn rebuilds(&self) -> RebuildCounts {
        self.rebuilds
    }

    /// Returns the number of input bytes consumed by the last successful call.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Decompresses the container in 'src' into the start of 'dst' and
    /// returns the number of bytes written.
    pub fn decompress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, LzmaError> {
        self.decompress_at(src, 0, src.len(), dst, 0)
    }

    /// Decompresses the container in 'src[src_offset..src_offset + src_len]'
    /// into 'dst' starting at 'dst_offset'. Returns the number of bytes
    /// written. If the payload has no declared size and 'dst' fills up before
    /// the end marker, the bytes that fit are returned.
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
        let src = &src[src_offset..src_offset + src_len];
        let mut input = VolumeReader::wrapped(src, 0);
        let dst = &mut dst[dst_offset..];

        let header = Header::read(&mut input)?;
        let size = header.uncompressed_size;
        if size == Some(0) {
            self.consumed = input.size();
            return Ok(0);
        }

        // The window never needs to hold more than the output can.
        let reach = size.unwrap_or(dst.len() as u64);
        let dict_size =
            normalize_dict_size(reach.min(header.dict_size as u64) as u32);
        if let Some(size) = size {
            if (dst.len() as u64) < size {
                return Err(LzmaError::PayloadTooLarge {
                    size,
                    limit: dst.len() as u64,
                });
            }
        }

        self.prepare(header.props, dict_size, &mut input)?;
        let written = self.decode(size, &mut input, dst)?;
        self.consumed = input.size();
        Ok(written)
    }

    /// Brings the decoder state in line with the header, rebuilding only what
    /// changed, and binds the range decoder to 'input'.
    fn prepare(
        &mut self,
        props: Properties,
        dict_size: u32,
        input: &mut VolumeReader,
    ) -> Result<(), LzmaError> {
        let props_byte = props.to_byte();
        let rebuild_model = self.last_props != Some(props_byte);
        let rebuild_window = self.last_dict_size != Some(dict_size);

        match &mut self.codec {
            None => {
                log::debug!(
                    "Building the decoder: props={} dict_size={}",
                    props_byte,
                    dict_size
                );
                let mut rc = RangeDecoder::new();
                rc.rewrap(input)?;
                self.codec = Some(Codec {
                    lz: LzDict::new(dict_size as usize),
                    rc,
                    lzma: LzmaDecoder::new(props),
                });
                self.rebuilds.window += 1;
                self.rebuilds.model += 1;
            }
            Some(codec) => {
                // Nothing is touched until the payload is known to start
                // correctly.
                codec.rc.rewrap(input)?;
                if rebuild_window {
                    log::debug!("Resizing the decoder window to {}", dict_size);
                    codec.lz.reset_with_size(dict_size as usize);
                    self.rebuilds.window += 1;
                } else {
                    codec.lz.reset();
                }
                if rebuild_model {
                    log::debug!(
                        "Rebuilding the decoder model for props={}",
                        props_byte
                    );
                    codec.lzma = LzmaDecoder::new(props);
                    self.rebuilds.model += 1;
                } else {
                    codec.lzma.reset();
                }
            }
        }

        // Only record the parameters once the state matches them.
        self.last_props = Some(props_byte);
        self.last_dict_size = Some(dict_size);
        Ok(())
    }

    /// Runs the decoder until 'size' bytes were produced, the end marker was
    /// found, or 'dst' is full.
    fn decode(
        &mut self,
        size: Option<u64>,
        input: &mut VolumeReader,
        dst: &mut [u8],
    ) -> Result<usize, LzmaError> {
        let codec = match self.codec.as_mut() {
            Some(codec) => codec,
            None => return Err(LzmaError::CorruptedPayload),
        };
        let mut remaining = size;
        let mut written = 0;

        while written < dst.len() {
            let space = (dst.len() - written) as u64;
            let want = remaining.map_or(space, |left| left.min(space));
            codec.lz.set_limit(want as usize);

            let mut at_end_marker = false;
            match codec.lzma.decode(&mut codec.lz, &mut codec.rc, input) {
                Ok(()) => {}
                Err(LzmaError::CorruptedPayload)
                    if remaining.is_none()
                        && codec.lzma.end_marker_detected() =>
                {
                    codec.rc.normalize(input)?;
                    at_end_marker = true;
                }
                Err(err) => return Err(err),
            }

            let copied = codec.lz.flush(&mut dst[written..]);
            written += copied;

            let finished = match remaining.as_mut() {
                Some(left) => {
                    *left -= copied as u64;
                    *left == 0
                }
                None => at_end_marker,
            };
            if finished {
                if codec.lz.has_pending() || !codec.rc.is_finished() {
                    return Err(LzmaError::CorruptedPayload);
                }
                return Ok(written);
            }
        }

        // The destination filled up before the end of a stream of unknown
        // size.
        Ok(written)
    }
}

impl Decompressor for DecompressCtx {
    fn decompress(
        &mut self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize, LzmaError> {
        DecompressCtx::decompress(self, src, dst)
    }
}
