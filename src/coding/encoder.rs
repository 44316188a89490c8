//! The LZMA symbol encoder. It parses the window into literals, matches and
//! repeated matches with a greedy (optionally one-step lazy) strategy, and
//! codes the symbols with the adaptive models.

use crate::coding::range::RangeEncoder;
use crate::error::LzmaError;
use crate::lz::window::LzWindow;
use crate::models::{
    dist_slot, dist_state, footer_bits, slot_base, LzmaModel, ALIGN_BITS,
    ALIGN_MASK, DIST_MODEL_END, DIST_MODEL_START, MATCH_LEN_MAX, MATCH_LEN_MIN,
};
use crate::options::Options;
use crate::volume::VolumeWriter;

/// Three-byte matches that are further than this are coded as literals.
const FAR_SHORT_MATCH: usize = 1 << 14;

/// A parsing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Literal,
    /// A single byte at the last match distance.
    ShortRep,
    /// A match at one of the four last distances.
    Rep { index: usize, len: usize },
    /// A match at a new zero-based distance.
    Match { dist: u32, len: usize },
}

impl Symbol {
    fn len(&self) -> usize {
        match *self {
            Symbol::Literal | Symbol::ShortRep => 1,
            Symbol::Rep { len, .. } | Symbol::Match { len, .. } => len,
        }
    }
}

pub struct LzmaEncoder {
    model: LzmaModel,
    nice_len: usize,
    depth: usize,
    lazy: bool,
}

impl LzmaEncoder {
    pub fn new(options: &Options) -> Self {
        Self {
            model: LzmaModel::new(options.props),
            nice_len: options.nice_len,
            depth: options.depth,
            lazy: options.lazy,
        }
    }

    /// Prepares the model for a new stream.
    pub fn reset(&mut self) {
        self.model.reset();
    }

    /// Encodes every symbol that the data in the window allows. Unless the
    /// window is finishing, a full lookahead is left unencoded.
    pub fn encode_step(
        &mut self,
        lz: &mut LzWindow,
        rc: &mut RangeEncoder,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        while lz.has_enough_data() {
            let symbol = self.next_symbol(lz);
            self.encode_symbol(lz, rc, symbol, out)?;
            lz.advance(symbol.len());
        }
        Ok(())
    }

    /// Encodes the marker that terminates a stream of unknown size.
    pub fn encode_end_marker(
        &mut self,
        lz: &LzWindow,
        rc: &mut RangeEncoder,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let pos_state = self.model.pos_state(lz.pos());
        let state = self.model.state.get();
        rc.encode_bit(&mut self.model.is_match[state][pos_state], 1, out)?;
        rc.encode_bit(&mut self.model.is_rep[state], 0, out)?;
        self.encode_match(rc, u32::MAX, MATCH_LEN_MIN, pos_state, out)
    }

    fn next_symbol(&mut self, lz: &mut LzWindow) -> Symbol {
        let avail = lz.avail().min(MATCH_LEN_MAX);

        let mut rep_len = 0;
        let mut rep_index = 0;
        if avail >= MATCH_LEN_MIN {
            for (index, &rep) in self.model.reps.iter().enumerate() {
                let len = lz.rep_len(rep, avail);
                if len >= self.nice_len {
                    return Symbol::Rep { index, len };
                }
                if len > rep_len {
                    rep_len = len;
                    rep_index = index;
                }
            }
        }

        let (main_len, main_dist) =
            lz.find_match(0, self.nice_len, self.depth).unwrap_or((0, 0));
        if main_len >= self.nice_len {
            return Symbol::Match {
                dist: (main_dist - 1) as u32,
                len: main_len,
            };
        }

        if rep_len >= MATCH_LEN_MIN
            && (rep_len + 1 >= main_len
                || (rep_len + 2 >= main_len && main_dist >= 1 << 9)
                || (rep_len + 3 >= main_len && main_dist >= 1 << 15))
        {
            return Symbol::Rep {
                index: rep_index,
                len: rep_len,
            };
        }

        if main_len < 3 || (main_len == 3 && main_dist > FAR_SHORT_MATCH) {
            return self.literal_or_short_rep(lz);
        }

        // Enable a form of non-greedy parsing: give up the match if the next
        // position has a longer one.
        if self.lazy {
            if let Some((next_len, _)) =
                lz.find_match(1, self.nice_len, self.depth)
            {
                if next_len > main_len {
                    return self.literal_or_short_rep(lz);
                }
            }
        }

        Symbol::Match {
            dist: (main_dist - 1) as u32,
            len: main_len,
        }
    }

    fn literal_or_short_rep(&self, lz: &LzWindow) -> Symbol {
        if lz.rep_len(self.model.reps[0], 1) == 1 {
            Symbol::ShortRep
        } else {
            Symbol::Literal
        }
    }

    fn encode_symbol(
        &mut self,
        lz: &LzWindow,
        rc: &mut RangeEncoder,
        symbol: Symbol,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let pos = lz.pos();
        let pos_state = self.model.pos_state(pos);
        let state = self.model.state.get();
        let is_match = &mut self.model.is_match[state][pos_state];

        match symbol {
            Symbol::Literal => {
                rc.encode_bit(is_match, 0, out)?;
                self.encode_literal(lz, rc, pos, out)
            }
            Symbol::ShortRep => {
                rc.encode_bit(is_match, 1, out)?;
                rc.encode_bit(&mut self.model.is_rep[state], 1, out)?;
                self.encode_rep_match(rc, 0, 1, pos_state, out)
            }
            Symbol::Rep { index, len } => {
                rc.encode_bit(is_match, 1, out)?;
                rc.encode_bit(&mut self.model.is_rep[state], 1, out)?;
                self.encode_rep_match(rc, index, len, pos_state, out)
            }
            Symbol::Match { dist, len } => {
                rc.encode_bit(is_match, 1, out)?;
                rc.encode_bit(&mut self.model.is_rep[state], 0, out)?;
                self.encode_match(rc, dist, len, pos_state, out)
            }
        }
    }

    fn encode_literal(
        &mut self,
        lz: &LzWindow,
        rc: &mut RangeEncoder,
        pos: u32,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let byte = lz.current_byte();
        let prev_byte = lz.prev_byte();
        if self.model.state.is_literal() {
            self.model
                .literal
                .encode_normal(rc, byte, prev_byte, pos, out)?;
        } else {
            let match_byte = lz.byte_back(self.model.reps[0] as usize + 1);
            self.model
                .literal
                .encode_matched(rc, byte, match_byte, prev_byte, pos, out)?;
        }
        self.model.state.update_literal();
        Ok(())
    }

    fn encode_match(
        &mut self,
        rc: &mut RangeEncoder,
        dist: u32,
        len: usize,
        pos_state: usize,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        self.model.state.update_match();
        self.model.match_len.encode(rc, len, pos_state, out)?;

        let slot = dist_slot(dist);
        let slot_probs = &mut self.model.dist_slots[dist_state(len)];
        rc.encode_bit_tree(slot_probs, slot, out)?;

        if slot >= DIST_MODEL_START {
            let footer = footer_bits(slot);
            let reduced = dist - slot_base(slot);
            if slot < DIST_MODEL_END {
                let probs = self.model.dist_special(slot);
                rc.encode_reverse_bit_tree(probs, reduced, out)?;
            } else {
                let high = reduced >> ALIGN_BITS;
                rc.encode_direct_bits(high, footer - ALIGN_BITS, out)?;
                let align = &mut self.model.dist_align;
                rc.encode_reverse_bit_tree(align, reduced & ALIGN_MASK, out)?;
            }
        }

        let reps = &mut self.model.reps;
        *reps = [dist, reps[0], reps[1], reps[2]];
        Ok(())
    }

    fn encode_rep_match(
        &mut self,
        rc: &mut RangeEncoder,
        index: usize,
        len: usize,
        pos_state: usize,
        out: &mut VolumeWriter,
    ) -> Result<(), LzmaError> {
        let state = self.model.state.get();
        let model = &mut self.model;

        if index == 0 {
            rc.encode_bit(&mut model.is_rep0[state], 0, out)?;
            let long = (len != 1) as u32;
            let is_long = &mut model.is_rep0_long[state][pos_state];
            rc.encode_bit(is_long, long, out)?;
        } else {
            let dist = model.reps[index];
            rc.encode_bit(&mut model.is_rep0[state], 1, out)?;
            if index == 1 {
                rc.encode_bit(&mut model.is_rep1[state], 0, out)?;
            } else {
                rc.encode_bit(&mut model.is_rep1[state], 1, out)?;
                let bit = (index - 2) as u32;
                rc.encode_bit(&mut model.is_rep2[state], bit, out)?;
                if index == 3 {
                    model.reps[3] = model.reps[2];
                }
                model.reps[2] = model.reps[1];
            }
            model.reps[1] = model.reps[0];
            model.reps[0] = dist;
        }

        if len == 1 {
            model.state.update_short_rep();
        } else {
            model.rep_len.encode(rc, len, pos_state, out)?;
            model.state.update_long_rep();
        }
        Ok(())
    }
}
