//! The LZMA symbol decoder.

use crate::coding::range::RangeDecoder;
use crate::error::LzmaError;
use crate::header::Properties;
use crate::lz::dict::LzDict;
use crate::models::{
    dist_state, footer_bits, slot_base, LzmaModel, ALIGN_BITS, DIST_MODEL_END,
    DIST_MODEL_START,
};
use crate::volume::VolumeReader;

/// The zero-based distance that marks the end of a stream.
const END_MARKER_DIST: u32 = u32::MAX;

pub struct LzmaDecoder {
    model: LzmaModel,
}

impl LzmaDecoder {
    pub fn new(props: Properties) -> Self {
        Self {
            model: LzmaModel::new(props),
        }
    }

    /// Prepares the model for a new stream.
    pub fn reset(&mut self) {
        self.model.reset();
    }

    /// Returns true if the last decoded match was the end marker. The window
    /// rejects that match as corrupted, and this tells the two apart.
    pub fn end_marker_detected(&self) -> bool {
        self.model.reps[0] == END_MARKER_DIST
    }

    /// Decodes symbols until the window reaches its limit. A match that
    /// crosses the limit is finished by the next call.
    pub fn decode(
        &mut self,
        lz: &mut LzDict,
        rc: &mut RangeDecoder,
        input: &mut VolumeReader,
    ) -> Result<(), LzmaError> {
        lz.repeat_pending()?;

        while lz.has_space() {
            let pos_state = self.model.pos_state(lz.pos() as u32);
            let state = self.model.state.get();
            let is_match = &mut self.model.is_match[state][pos_state];

            if rc.decode_bit(is_match, input)? == 0 {
                self.decode_literal(lz, rc, input)?;
                continue;
            }

            let is_rep = &mut self.model.is_rep[state];
            let len = if rc.decode_bit(is_rep, input)? == 0 {
                self.decode_match(rc, pos_state, input)?
            } else {
                self.decode_rep_match(rc, pos_state, input)?
            };
            lz.repeat(self.model.reps[0] as usize, len)?;
        }

        rc.normalize(input)
    }

    fn decode_literal(
        &mut self,
        lz: &mut LzDict,
        rc: &mut RangeDecoder,
        input: &mut VolumeReader,
    ) -> Result<(), LzmaError> {
        let prev_byte = lz.get_byte(0);
        let pos = lz.pos() as u32;
        let byte = if self.model.state.is_literal() {
            self.model.literal.decode_normal(rc, prev_byte, pos, input)?
        } else {
            let match_byte = lz.get_byte(self.model.reps[0] as usize);
            self.model
                .literal
                .decode_matched(rc, match_byte, prev_byte, pos, input)?
        };
        lz.put_byte(byte);
        self.model.state.update_literal();
        Ok(())
    }

    /// Decodes a match with a new distance and returns its length.
    fn decode_match(
        &mut self,
        rc: &mut RangeDecoder,
        pos_state: usize,
        input: &mut VolumeReader,
    ) -> Result<usize, LzmaError> {
        let model = &mut self.model;
        model.state.update_match();
        model.reps[3] = model.reps[2];
        model.reps[2] = model.reps[1];
        model.reps[1] = model.reps[0];

        let len = model.match_len.decode(rc, pos_state, input)?;
        let slot_probs = &mut model.dist_slots[dist_state(len)];
        let slot = rc.decode_bit_tree(slot_probs, input)?;

        model.reps[0] = if slot < DIST_MODEL_START {
            slot
        } else if slot < DIST_MODEL_END {
            let probs = model.dist_special(slot);
            slot_base(slot) + rc.decode_reverse_bit_tree(probs, input)?
        } else {
            let count = footer_bits(slot) - ALIGN_BITS;
            let high = rc.decode_direct_bits(count, input)? << ALIGN_BITS;
            let align =
                rc.decode_reverse_bit_tree(&mut model.dist_align, input)?;
            slot_base(slot) | high | align
        };
        Ok(len)
    }

    /// Decodes a match at one of the last four distances and returns its
    /// length.
    fn decode_rep_match(
        &mut self,
        rc: &mut RangeDecoder,
        pos_state: usize,
        input: &mut VolumeReader,
    ) -> Result<usize, LzmaError> {
        let model = &mut self.model;
        let state = model.state.get();

        if rc.decode_bit(&mut model.is_rep0[state], input)? == 0 {
            let is_long = &mut model.is_rep0_long[state][pos_state];
            if rc.decode_bit(is_long, input)? == 0 {
                model.state.update_short_rep();
                return Ok(1);
            }
        } else {
            let dist;
            if rc.decode_bit(&mut model.is_rep1[state], input)? == 0 {
                dist = model.reps[1];
            } else {
                if rc.decode_bit(&mut model.is_rep2[state], input)? == 0 {
                    dist = model.reps[2];
                } else {
                    dist = model.reps[3];
                    model.reps[3] = model.reps[2];
                }
                model.reps[2] = model.reps[1];
            }
            model.reps[1] = model.reps[0];
            model.reps[0] = dist;
        }

        model.state.update_long_rep();
        model.rep_len.decode(rc, pos_state, input)
    }
}
