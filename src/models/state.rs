//! The LZMA state machine, which remembers the kinds of the last few symbols.

/// The number of states.
pub const STATES: usize = 12;
/// States below this value follow a literal.
const LIT_STATES: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State(u8);

impl State {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Returns the state as an index into the probability tables.
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Returns true if the previous symbol was a literal.
    #[inline]
    pub fn is_literal(self) -> bool {
        self.0 < LIT_STATES
    }

    pub fn update_literal(&mut self) {
        self.0 = match self.0 {
            0..=3 => 0,
            4..=9 => self.0 - 3,
            _ => self.0 - 6,
        };
    }

    pub fn update_match(&mut self) {
        self.0 = if self.is_literal() { 7 } else { 10 };
    }

    pub fn update_long_rep(&mut self) {
        self.0 = if self.is_literal() { 8 } else { 11 };
    }

    pub fn update_short_rep(&mut self) {
        self.0 = if self.is_literal() { 9 } else { 11 };
    }
}

#[test]
fn test_state_transitions() {
    let mut state = State::new();
    state.update_match();
    assert_eq!(state.get(), 7);
    assert!(!state.is_literal());
    state.update_literal();
    assert_eq!(state.get(), 4);
    state.update_short_rep();
    assert_eq!(state.get(), 9);
    state.update_long_rep();
    assert_eq!(state.get(), 11);
    state.update_literal();
    assert_eq!(state.get(), 5);
    for _ in 0..3 {
        state.update_literal();
    }
    assert_eq!(state.get(), 0);
    assert!(state.is_literal());
}
