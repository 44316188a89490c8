//! The model for match lengths. Short lengths are coded with a tree per
//! position state, long lengths with one shared tree.

use super::{MATCH_LEN_MIN, POS_STATES_MAX};
use crate::coding::range::{init_probs, RangeDecoder, RangeEncoder};
use crate::error::LzmaError;
use crate::volume::{VolumeReader, VolumeWriter};

const LOW_SYMBOLS: usize = 1 << 3;
const MID_SYMBOLS: usize = 1 << 3;
const HIGH_SYMBOLS: usize = 1 << 8;

pub struct LengthModel {
    choice: [u16; 2],
    low: [[u16; LOW_SYMBOLS]; POS_STATES_MAX],
    mid: [[u16; MID_SYMBOLS]; POS_STATES_MAX],
    high: [u16; HIGH_SYMBOLS],
}

impl Default for LengthModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LengthModel {
    pub fn new() -> Self {
        let mut model = Self {
            choice: [0; 2],
            low: [[0; LOW_SYMBOLS]; POS_STATES_MAX],
            mid: [[0; MID_SYMBOLS]; POS_STATES_MAX],
            high: [0; HIGH_SYMBOLS],
        };
        model.reset();
        model
    }

    pub fn reset(&mut self) {
        init_probs(&mut self.choice);
        for probs in self.low.iter_mut() {
            init_probs(probs);
        }
        for probs in self.mid.iter_mut() {
            init_probs(probs);
        }
        init_probs(&mut self.high);
    }

    /// Encode the match length 'len' (2..=273).
    pub fn encode(
        &mut self,
        rc: &mut RangeEncoder,
        len: usize,
        pos_state: usize,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let len = (len - MATCH_LEN_MIN) as u32;
        if len < LOW_SYMBOLS as u32 {
            rc.encode_bit(&mut self.choice[0], 0, out)?;
            return rc.encode_bit_tree(&mut self.low[pos_state], len, out);
        }
        rc.encode_bit(&mut self.choice[0], 1, out)?;
        let len = len - LOW_SYMBOLS as u32;
        if len < MID_SYMBOLS as u32 {
            rc.encode_bit(&mut self.choice[1], 0, out)?;
            return rc.encode_bit_tree(&mut self.mid[pos_state], len, out);
        }
        rc.encode_bit(&mut self.choice[1], 1, out)?;
        let len = len - MID_SYMBOLS as u32;
        rc.encode_bit_tree(&mut self.high, len, out)
    }

    /// Decode a match length.
    pub fn decode(
        &mut self,
        rc: &mut RangeDecoder,
        pos_state: usize,
        input: &mut VolumeReader,
    ) -> Result<usize, LzmaError> {
        if rc.decode_bit(&mut self.choice[0], input)? == 0 {
            let len = rc.decode_bit_tree(&mut self.low[pos_state], input)?;
            return Ok(len as usize + MATCH_LEN_MIN);
        }
        if rc.decode_bit(&mut self.choice[1], input)? == 0 {
            let len = rc.decode_bit_tree(&mut self.mid[pos_state], input)?;
            return Ok(len as usize + MATCH_LEN_MIN + LOW_SYMBOLS);
        }
        let len = rc.decode_bit_tree(&mut self.high, input)?;
        Ok(len as usize + MATCH_LEN_MIN + LOW_SYMBOLS + MID_SYMBOLS)
    }
}
