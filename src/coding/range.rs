//! This module implements the LZMA range coder: a binary arithmetic coder with
//! adaptive 11-bit probabilities, plus helpers for coding bit trees and
//! fixed-probability ("direct") bits.

use crate::error::LzmaError;
use crate::volume::{VolumeReader, VolumeWriter};

const BIT_MODEL_TOTAL_BITS: u32 = 11;
const BIT_MODEL_TOTAL: u32 = 1 << BIT_MODEL_TOTAL_BITS;
const MOVE_BITS: u32 = 5;
const TOP_VALUE: u32 = 1 << 24;

/// The initial probability: both bits are equally likely.
pub const PROB_INIT: u16 = (BIT_MODEL_TOTAL / 2) as u16;

/// Resets every probability in 'probs' to the initial value.
pub fn init_probs(probs: &mut [u16]) {
    probs.fill(PROB_INIT);
}

pub struct RangeEncoder {
    /// The low side of the range. Bit 32 holds a pending carry.
    low: u64,
    /// The width of the range.
    range: u32,
    /// The last byte that was shifted out and may still receive a carry.
    cache: u8,
    /// The number of bytes that are waiting for the carry to be resolved.
    cache_size: u64,
}

impl Default for RangeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeEncoder {
    pub fn new() -> Self {
        Self {
            low: 0,
            range: u32::MAX,
            cache: 0,
            cache_size: 1,
        }
    }

    /// Prepares the encoder for a new stream.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn shift_low(&mut self, out: &mut VolumeWriter) -> Result<(), LzmaError> {
        let carry = (self.low >> 32) as u8;
        if carry != 0 || self.low < 0xff00_0000 {
            let mut temp = self.cache;
            loop {
                out.write_u8(temp.wrapping_add(carry))?;
                temp = 0xff;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }
            self.cache = (self.low >> 24) as u8;
        }
        self.cache_size += 1;
        self.low = (self.low & 0x00ff_ffff) << 8;
        Ok(())
    }

    /// Encode the bit 'bit' with the adaptive probability 'prob', and update
    /// the probability.
    #[inline]
    pub fn encode_bit(
        &mut self,
        prob: &mut u16,
        bit: u32,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * (*prob as u32);
        if bit == 0 {
            self.range = bound;
            *prob += ((BIT_MODEL_TOTAL - *prob as u32) >> MOVE_BITS) as u16;
        } else {
            self.low += bound as u64;
            self.range -= bound;
            *prob -= *prob >> MOVE_BITS;
        }

        if self.range < TOP_VALUE {
            self.range <<= 8;
            self.shift_low(out)?;
        }
        Ok(())
    }

    /// Encode the 'log2(probs.len())' low bits of 'symbol', most significant
    /// bit first.
    pub fn encode_bit_tree(
        &mut self,
        probs: &mut [u16],
        symbol: u32,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let mut index = 1;
        let mut mask = probs.len() as u32;
        loop {
            mask >>= 1;
            let bit = (symbol & mask != 0) as u32;
            self.encode_bit(&mut probs[index], bit, out)?;
            index = (index << 1) | bit as usize;
            if mask == 1 {
                return Ok(());
            }
        }
    }

    /// Encode the 'log2(probs.len())' low bits of 'symbol', least significant
    /// bit first.
    pub fn encode_reverse_bit_tree(
        &mut self,
        probs: &mut [u16],
        symbol: u32,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let mut index = 1;
        let mut symbol = symbol | probs.len() as u32;
        loop {
            let bit = symbol & 1;
            symbol >>= 1;
            self.encode_bit(&mut probs[index], bit, out)?;
            index = (index << 1) | bit as usize;
            if symbol == 1 {
                return Ok(());
            }
        }
    }

    /// Encode the 'count' low bits of 'value' with a fixed probability of one
    /// half.
    pub fn encode_direct_bits(
        &mut self,
        value: u32,
        count: u32,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        for i in (0..count).rev() {
            self.range >>= 1;
            let bit = (value >> i) & 1;
            self.low += (self.range & 0u32.wrapping_sub(bit)) as u64;
            if self.range < TOP_VALUE {
                self.range <<= 8;
                self.shift_low(out)?;
            }
        }
        Ok(())
    }

    /// Flush the remaining state of the coder into the output.
    pub fn finish(&mut self, out: &mut VolumeWriter) -> Result<(), LzmaError> {
        for _ in 0..5 {
            self.shift_low(out)?;
        }
        Ok(())
    }
}

pub struct RangeDecoder {
    /// The width of the range.
    range: u32,
    /// The offset of the encoded value inside the range.
    code: u32,
}

impl Default for RangeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeDecoder {
    pub fn new() -> Self {
        Self { range: 0, code: 0 }
    }

    /// Start decoding a new stream at the cursor of 'input'. The first byte
    /// of every stream is zero.
    pub fn rewrap(
        &mut self,
        input: &mut VolumeReader,
    ) -> Result<(), LzmaError> {
        if input.read_u8()? != 0 {
            return Err(LzmaError::CorruptedPayload);
        }
        self.code = input.read_u32_le()?.swap_bytes();
        self.range = u32::MAX;
        Ok(())
    }

    /// Returns true if the stream was fully consumed. This is only meaningful
    /// after the last symbol was decoded and the decoder was normalized.
    pub fn is_finished(&self) -> bool {
        self.code == 0
    }

    /// Pull in the next input byte if the range became too narrow.
    #[inline]
    pub fn normalize(
        &mut self,
        input: &mut VolumeReader,
    ) -> Result<(), LzmaError> {
        if self.range < TOP_VALUE {
            self.code = (self.code << 8) | input.read_u8()? as u32;
            self.range <<= 8;
        }
        Ok(())
    }

    /// Decode one bit with the adaptive probability 'prob', and update the
    /// probability.
    #[inline]
    pub fn decode_bit(
        &mut self,
        prob: &mut u16,
        input: &mut VolumeReader,
    ) -> Result<u32, LzmaError> {
        self.normalize(input)?;
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * (*prob as u32);
        if self.code < bound {
            self.range = bound;
            *prob += ((BIT_MODEL_TOTAL - *prob as u32) >> MOVE_BITS) as u16;
            Ok(0)
        } else {
            self.range -= bound;
            self.code -= bound;
            *prob -= *prob >> MOVE_BITS;
            Ok(1)
        }
    }

    /// Decode 'log2(probs.len())' bits, most significant bit first.
    pub fn decode_bit_tree(
        &mut self,
        probs: &mut [u16],
        input: &mut VolumeReader,
    ) -> Result<u32, LzmaError> {
        let mut symbol = 1;
        while symbol < probs.len() {
            let bit = self.decode_bit(&mut probs[symbol], input)?;
            symbol = (symbol << 1) | bit as usize;
        }
        Ok((symbol - probs.len()) as u32)
    }

    /// Decode 'log2(probs.len())' bits, least significant bit first.
    pub fn decode_reverse_bit_tree(
        &mut self,
        probs: &mut [u16],
        input: &mut VolumeReader,
    ) -> Result<u32, LzmaError> {
        let mut symbol = 1;
        let mut i = 0;
        let mut result = 0;
        while symbol < probs.len() {
            let bit = self.decode_bit(&mut probs[symbol], input)?;
            symbol = (symbol << 1) | bit as usize;
            result |= bit << i;
            i += 1;
        }
        Ok(result)
    }

    /// Decode 'count' bits that were coded with a fixed probability.
    pub fn decode_direct_bits(
        &mut self,
        count: u32,
        input: &mut VolumeReader,
    ) -> Result<u32, LzmaError> {
        let mut result = 0;
        for _ in 0..count {
            self.normalize(input)?;
            self.range >>= 1;
            let t = self.code.wrapping_sub(self.range) >> 31;
            self.code = self.code.wrapping_sub(self.range & t.wrapping_sub(1));
            result = (result << 1) | (1 - t);
        }
        Ok(result)
    }
}

#[cfg(test)]
fn encode_with<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut RangeEncoder, &mut VolumeWriter),
{
    let mut buf = vec![0u8; 1 << 12];
    let mut out = VolumeWriter::wrapped(&mut buf, 0);
    let mut encoder = RangeEncoder::new();
    f(&mut encoder, &mut out);
    encoder.finish(&mut out).unwrap();
    let len = out.size();
    buf.truncate(len);
    buf
}

#[test]
fn test_encoder_decoder_bits() {
    let test_vector = [
        1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 1, 1,
    ];
    let stream = encode_with(|enc, out| {
        let mut prob = PROB_INIT;
        for &bit in test_vector.iter() {
            enc.encode_bit(&mut prob, bit, out).unwrap();
        }
    });
    assert_eq!(stream[0], 0);

    let mut input = VolumeReader::wrapped(&stream, 0);
    let mut decoder = RangeDecoder::new();
    decoder.rewrap(&mut input).unwrap();
    let mut prob = PROB_INIT;
    for &bit in test_vector.iter() {
        assert_eq!(decoder.decode_bit(&mut prob, &mut input).unwrap(), bit);
    }
    decoder.normalize(&mut input).unwrap();
    assert!(decoder.is_finished());
    assert_eq!(input.remaining(), 0);
}

#[test]
fn test_encoder_decoder_trees() {
    let symbols = [0u32, 5, 63, 17, 42, 1, 33, 62, 0, 0, 0];
    let stream = encode_with(|enc, out| {
        let mut tree = [PROB_INIT; 64];
        let mut reverse = [PROB_INIT; 64];
        for &s in symbols.iter() {
            enc.encode_bit_tree(&mut tree, s, out).unwrap();
            enc.encode_reverse_bit_tree(&mut reverse, s, out).unwrap();
            enc.encode_direct_bits(s * 1001, 16, out).unwrap();
        }
    });

    let mut input = VolumeReader::wrapped(&stream, 0);
    let mut decoder = RangeDecoder::new();
    decoder.rewrap(&mut input).unwrap();
    let mut tree = [PROB_INIT; 64];
    let mut reverse = [PROB_INIT; 64];
    for &s in symbols.iter() {
        assert_eq!(decoder.decode_bit_tree(&mut tree, &mut input), Ok(s));
        assert_eq!(
            decoder.decode_reverse_bit_tree(&mut reverse, &mut input),
            Ok(s)
        );
        assert_eq!(decoder.decode_direct_bits(16, &mut input), Ok(s * 1001));
    }
    decoder.normalize(&mut input).unwrap();
    assert!(decoder.is_finished());
}

#[test]
fn test_decoder_rejects_nonzero_first_byte() {
    let stream = [1u8, 0, 0, 0, 0];
    let mut input = VolumeReader::wrapped(&stream, 0);
    let mut decoder = RangeDecoder::new();
    assert_eq!(
        decoder.rewrap(&mut input),
        Err(LzmaError::CorruptedPayload)
    );
}

#[test]
fn test_encoder_overflow_is_reported() {
    let mut buf = [0u8; 2];
    let mut out = VolumeWriter::wrapped(&mut buf, 0);
    let mut encoder = RangeEncoder::new();
    assert!(matches!(
        encoder.finish(&mut out),
        Err(LzmaError::BufferOverflow { .. })
    ));
}
