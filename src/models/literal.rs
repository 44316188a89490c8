//! The literal model. Each literal is coded with one of 2^(lc+lp) tables of
//! 0x300 probabilities, selected by the high bits of the previous byte and the
//! low bits of the position. After a match the byte at the last match distance
//! is used as extra context until the first mismatching bit.

use crate::coding::range::{RangeDecoder, RangeEncoder, PROB_INIT};
use crate::error::LzmaError;
use crate::volume::{VolumeReader, VolumeWriter};

const SUBCODER_SIZE: usize = 0x300;

pub struct LiteralModel {
    lc: u32,
    lp_mask: u32,
    probs: Vec<u16>,
}

impl LiteralModel {
    pub fn new(lc: u32, lp: u32) -> Self {
        Self {
            lc,
            lp_mask: (1 << lp) - 1,
            probs: vec![PROB_INIT; SUBCODER_SIZE << (lc + lp)],
        }
    }

    pub fn reset(&mut self) {
        self.probs.fill(PROB_INIT);
    }

    fn subcoder(&mut self, prev_byte: u8, pos: u32) -> &mut [u16] {
        let low = (prev_byte as u32) >> (8 - self.lc);
        let high = (pos & self.lp_mask) << self.lc;
        let start = (low + high) as usize * SUBCODER_SIZE;
        &mut self.probs[start..start + SUBCODER_SIZE]
    }

    /// Encode 'byte' without a match byte.
    pub fn encode_normal(
        &mut self,
        rc: &mut RangeEncoder,
        byte: u8,
        prev_byte: u8,
        pos: u32,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let probs = self.subcoder(prev_byte, pos);
        let mut symbol = byte as u32 | 0x100;
        loop {
            let index = (symbol >> 8) as usize;
            rc.encode_bit(&mut probs[index], (symbol >> 7) & 1, out)?;
            symbol <<= 1;
            if symbol >= 0x10000 {
                return Ok(());
            }
        }
    }

    /// Encode 'byte' in the context of 'match_byte', the byte at the last
    /// match distance.
    pub fn encode_matched(
        &mut self,
        rc: &mut RangeEncoder,
        byte: u8,
        match_byte: u8,
        prev_byte: u8,
        pos: u32,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let probs = self.subcoder(prev_byte, pos);
        let mut match_byte = match_byte as u32;
        let mut offset = 0x100;
        let mut symbol = byte as u32 | 0x100;
        loop {
            match_byte <<= 1;
            let match_bit = match_byte & offset;
            let index = (offset + match_bit + (symbol >> 8)) as usize;
            rc.encode_bit(&mut probs[index], (symbol >> 7) & 1, out)?;
            symbol <<= 1;
            offset &= !(match_byte ^ symbol);
            if symbol >= 0x10000 {
                return Ok(());
            }
        }
    }

    /// Decode a byte without a match byte.
    pub fn decode_normal(
        &mut self,
        rc: &mut RangeDecoder,
        prev_byte: u8,
        pos: u32,
        input: &mut VolumeReader,
    ) -> Result<u8, LzmaError> {
        let probs = self.subcoder(prev_byte, pos);
        let mut symbol = 1;
        while symbol < 0x100 {
            let bit = rc.decode_bit(&mut probs[symbol], input)?;
            symbol = (symbol << 1) | bit as usize;
        }
        Ok(symbol as u8)
    }

    /// Decode a byte in the context of 'match_byte'.
    pub fn decode_matched(
        &mut self,
        rc: &mut RangeDecoder,
        match_byte: u8,
        prev_byte: u8,
        pos: u32,
        input: &mut VolumeReader,
    ) -> Result<u8, LzmaError> {
        let probs = self.subcoder(prev_byte, pos);
        let mut match_byte = match_byte as u32;
        let mut offset = 0x100;
        let mut symbol = 1;
        while symbol < 0x100 {
            match_byte <<= 1;
            let match_bit = match_byte & offset;
            let index = (offset + match_bit + symbol) as usize;
            let bit = rc.decode_bit(&mut probs[index], input)?;
            symbol = (symbol << 1) | bit;
            offset &= 0u32.wrapping_sub(bit) ^ !match_bit;
        }
        Ok(symbol as u8)
    }
}

#[test]
fn test_literal_round_trip() {
    let text = b"literal coding with and without match bytes";
    let mut buf = vec![0u8; 256];
    let mut out = VolumeWriter::wrapped(&mut buf, 0);
    let mut rc = RangeEncoder::new();
    let mut model = LiteralModel::new(3, 1);
    let mut prev = 0;
    for (pos, &byte) in text.iter().enumerate() {
        let pos = pos as u32;
        if pos % 2 == 0 {
            model.encode_normal(&mut rc, byte, prev, pos, &mut out).unwrap();
        } else {
            model
                .encode_matched(&mut rc, byte, b'e', prev, pos, &mut out)
                .unwrap();
        }
        prev = byte;
    }
    rc.finish(&mut out).unwrap();
    let len = out.size();

    let mut input = VolumeReader::wrapped(&buf[..len], 0);
    let mut rc = RangeDecoder::new();
    rc.rewrap(&mut input).unwrap();
    let mut model = LiteralModel::new(3, 1);
    let mut prev = 0;
    for (pos, &byte) in text.iter().enumerate() {
        let pos = pos as u32;
        let decoded = if pos % 2 == 0 {
            model.decode_normal(&mut rc, prev, pos, &mut input).unwrap()
        } else {
            model
                .decode_matched(&mut rc, b'e', prev, pos, &mut input)
                .unwrap()
        };
        assert_eq!(decoded, byte);
        prev = decoded;
    }
}
