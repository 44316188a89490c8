//! This module contains the probability models of the LZMA format. The
//! encoder and the decoder keep identical copies of these models and update
//! them in lockstep.

pub mod length;
pub mod literal;
pub mod state;

use crate::coding::range::init_probs;
use crate::header::Properties;
use length::LengthModel;
use literal::LiteralModel;
use state::{State, STATES};

pub const POS_STATES_MAX: usize = 1 << 4;

pub const MATCH_LEN_MIN: usize = 2;
pub const MATCH_LEN_MAX: usize = 273;

pub const REPS: usize = 4;

const DIST_STATES: usize = 4;
const DIST_SLOTS: usize = 1 << 6;
pub const DIST_MODEL_START: u32 = 4;
pub const DIST_MODEL_END: u32 = 14;
const DIST_SPECIAL_SLOTS: usize = (DIST_MODEL_END - DIST_MODEL_START) as usize;
pub const FULL_DISTANCES: u32 = 1 << (DIST_MODEL_END / 2);

pub const ALIGN_BITS: u32 = 4;
pub const ALIGN_SIZE: usize = 1 << ALIGN_BITS;
pub const ALIGN_MASK: u32 = ALIGN_SIZE as u32 - 1;

/// Returns the distance model state for a match of length 'len'.
#[inline]
pub fn dist_state(len: usize) -> usize {
    (len - MATCH_LEN_MIN).min(DIST_STATES - 1)
}

/// Returns the slot of the zero-based distance 'dist'.
pub fn dist_slot(dist: u32) -> u32 {
    if dist < DIST_MODEL_START {
        return dist;
    }
    let bits = 31 - dist.leading_zeros();
    (bits << 1) | ((dist >> (bits - 1)) & 1)
}

/// Returns the number of extra bits that follow the slot 'slot'.
#[inline]
pub fn footer_bits(slot: u32) -> u32 {
    (slot >> 1) - 1
}

/// Returns the smallest distance of the slot 'slot'.
#[inline]
pub fn slot_base(slot: u32) -> u32 {
    (2 | (slot & 1)) << footer_bits(slot)
}

/// The complete adaptive state of an LZMA coder.
pub struct LzmaModel {
    pub state: State,
    /// The last four match distances, zero based.
    pub reps: [u32; REPS],
    pub is_match: [[u16; POS_STATES_MAX]; STATES],
    pub is_rep: [u16; STATES],
    pub is_rep0: [u16; STATES],
    pub is_rep1: [u16; STATES],
    pub is_rep2: [u16; STATES],
    pub is_rep0_long: [[u16; POS_STATES_MAX]; STATES],
    pub dist_slots: [[u16; DIST_SLOTS]; DIST_STATES],
    /// Reverse trees for the low bits of the slots between DIST_MODEL_START
    /// and DIST_MODEL_END. Slot 'n' uses the first 1<<footer_bits(n) items.
    dist_special: [[u16; 32]; DIST_SPECIAL_SLOTS],
    pub dist_align: [u16; ALIGN_SIZE],
    pub match_len: LengthModel,
    pub rep_len: LengthModel,
    pub literal: LiteralModel,
    pos_mask: u32,
}

impl LzmaModel {
    pub fn new(props: Properties) -> Self {
        let mut model = Self {
            state: State::new(),
            reps: [0; REPS],
            is_match: [[0; POS_STATES_MAX]; STATES],
            is_rep: [0; STATES],
            is_rep0: [0; STATES],
            is_rep1: [0; STATES],
            is_rep2: [0; STATES],
            is_rep0_long: [[0; POS_STATES_MAX]; STATES],
            dist_slots: [[0; DIST_SLOTS]; DIST_STATES],
            dist_special: [[0; 32]; DIST_SPECIAL_SLOTS],
            dist_align: [0; ALIGN_SIZE],
            match_len: LengthModel::new(),
            rep_len: LengthModel::new(),
            literal: LiteralModel::new(props.lc, props.lp),
            pos_mask: (1 << props.pb) - 1,
        };
        model.reset_probs();
        model
    }

    fn reset_probs(&mut self) {
        for probs in self.is_match.iter_mut() {
            init_probs(probs);
        }
        init_probs(&mut self.is_rep);
        init_probs(&mut self.is_rep0);
        init_probs(&mut self.is_rep1);
        init_probs(&mut self.is_rep2);
        for probs in self.is_rep0_long.iter_mut() {
            init_probs(probs);
        }
        for probs in self.dist_slots.iter_mut() {
            init_probs(probs);
        }
        for probs in self.dist_special.iter_mut() {
            init_probs(probs);
        }
        init_probs(&mut self.dist_align);
        self.match_len.reset();
        self.rep_len.reset();
        self.literal.reset();
    }

    /// Returns the model to the state of a fresh stream, without touching the
    /// allocation of the literal tables.
    pub fn reset(&mut self) {
        self.state.reset();
        self.reps = [0; REPS];
        self.reset_probs();
    }

    /// Returns the position state of the stream position 'pos'.
    #[inline]
    pub fn pos_state(&self, pos: u32) -> usize {
        (pos & self.pos_mask) as usize
    }

    /// Returns the reverse tree of the slot 'slot'.
    pub fn dist_special(&mut self, slot: u32) -> &mut [u16] {
        let probs = &mut self.dist_special[(slot - DIST_MODEL_START) as usize];
        &mut probs[..1usize << footer_bits(slot)]
    }
}

#[test]
fn test_dist_slot() {
    assert_eq!(dist_slot(0), 0);
    assert_eq!(dist_slot(3), 3);
    assert_eq!(dist_slot(4), 4);
    assert_eq!(dist_slot(5), 4);
    assert_eq!(dist_slot(6), 5);
    assert_eq!(dist_slot(7), 5);
    assert_eq!(dist_slot(8), 6);
    assert_eq!(dist_slot(FULL_DISTANCES - 1), DIST_MODEL_END - 1);
    assert_eq!(dist_slot(FULL_DISTANCES), DIST_MODEL_END);
    assert_eq!(dist_slot(u32::MAX), 63);
    for slot in DIST_MODEL_START..64 {
        assert_eq!(dist_slot(slot_base(slot)), slot);
    }
}

#[test]
fn test_dist_state() {
    assert_eq!(dist_state(2), 0);
    assert_eq!(dist_state(4), 2);
    assert_eq!(dist_state(5), 3);
    assert_eq!(dist_state(273), 3);
}
