//! The encoder side of the LZ window, with a hash-chain match finder.
//!
//! Input is appended to a sliding buffer that keeps up to 'dict_size' bytes of
//! history behind the encoder position. The buffer grows on demand up to its
//! maximum and is never shrunk, so a context that compresses many small
//! buffers allocates once.
//!
//! Positions in the hash tables are absolute: they keep counting across
//! streams, and entries older than the current stream are ignored. This avoids
//! clearing the tables on every reset.

use crate::models::MATCH_LEN_MAX;

/// The number of bytes hashed per position.
const HASH_BYTES: usize = 3;
/// The size of the head table (1<<x).
const HASH_BITS: u32 = 16;
/// The smallest buffer that is allocated.
const MIN_BUF_SIZE: usize = 1 << 12;
/// Extra buffer space beyond the history, so the window does not slide on
/// every fill.
const RESERVE_MIN: usize = 1 << 16;
/// Absolute positions are renumbered before they reach this value.
const POS_LIMIT: u32 = 1 << 31;
/// The number of bytes the encoder needs in front of its position, to search
/// a full-length match one byte ahead.
pub const LOOKAHEAD: usize = MATCH_LEN_MAX + 1;

pub struct LzWindow {
    /// The history and the not-yet-encoded input.
    buf: Vec<u8>,
    /// For each buffer position, the absolute position of the previous string
    /// with the same hash.
    chain: Vec<u32>,
    /// Maps a hash to the absolute position of the last string with that hash.
    head: Vec<u32>,
    dict_size: usize,
    /// The largest the buffer may grow to.
    max_size: usize,
    /// The encoder position.
    read_pos: usize,
    /// The end of the valid input.
    write_pos: usize,
    /// Buffer positions below this one were inserted into the hash chains.
    hashed: usize,
    /// The absolute position of buf[0].
    base: u32,
    /// The absolute position of the first byte of the current stream.
    stream_start: u32,
    /// Set when no more input will arrive for this stream.
    finishing: bool,
}

impl LzWindow {
    pub fn new(dict_size: usize) -> Self {
        let reserve = (dict_size / 2).max(RESERVE_MIN);
        Self {
            buf: Vec::new(),
            chain: Vec::new(),
            head: vec![0; 1 << HASH_BITS],
            dict_size,
            max_size: dict_size + reserve + LOOKAHEAD,
            read_pos: 0,
            write_pos: 0,
            hashed: 0,
            base: 1,
            stream_start: 1,
            finishing: false,
        }
    }

    /// Prepares the window for a new stream. The buffer is kept.
    pub fn reset(&mut self) {
        let end = self.base + self.write_pos as u32;
        if end >= POS_LIMIT {
            self.head.fill(0);
            self.base = 1;
        } else {
            self.base = end;
        }
        self.stream_start = self.base;
        self.read_pos = 0;
        self.write_pos = 0;
        self.hashed = 0;
        self.finishing = false;
    }

    /// Copies as much of 'src' as fits into the window, and returns the number
    /// of bytes consumed.
    pub fn fill_window(&mut self, src: &[u8]) -> usize {
        debug_assert!(!self.finishing, "Filling a finished window");
        if self.write_pos == self.buf.len() {
            if self.buf.len() < self.max_size {
                self.grow(src.len());
            } else {
                self.slide();
            }
        }

        let len = src.len().min(self.buf.len() - self.write_pos);
        self.buf[self.write_pos..self.write_pos + len]
            .copy_from_slice(&src[..len]);
        self.write_pos += len;
        len
    }

    fn grow(&mut self, wanted: usize) {
        let size = (self.write_pos + wanted)
            .max(self.buf.len() * 2)
            .max(MIN_BUF_SIZE)
            .min(self.max_size);
        log::trace!("Growing the encoder window to {} bytes", size);
        self.buf.resize(size, 0);
        self.chain.resize(size, 0);
    }

    /// Discards the history that is out of reach of the encoder position.
    fn slide(&mut self) {
        let drop = self.read_pos.saturating_sub(self.dict_size);
        debug_assert!(drop > 0, "The window is full of unencoded input");
        self.buf.copy_within(drop..self.write_pos, 0);
        self.chain.copy_within(drop..self.write_pos, 0);
        self.read_pos -= drop;
        self.write_pos -= drop;
        self.hashed -= drop;
        self.base += drop as u32;
    }

    /// Marks the end of the input for this stream.
    pub fn set_finishing(&mut self) {
        self.finishing = true;
    }

    /// Returns true if there is enough input in front of the encoder position
    /// to make a parsing decision.
    pub fn has_enough_data(&self) -> bool {
        let avail = self.avail();
        avail >= LOOKAHEAD || (self.finishing && avail > 0)
    }

    /// Returns the number of bytes in front of the encoder position.
    pub fn avail(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// Returns the encoder position relative to the start of the stream.
    pub fn pos(&self) -> u32 {
        self.base + self.read_pos as u32 - self.stream_start
    }

    /// Returns the byte at the encoder position.
    pub fn current_byte(&self) -> u8 {
        self.buf[self.read_pos]
    }

    /// Returns the byte right before the encoder position, or zero at the
    /// start of the stream.
    pub fn prev_byte(&self) -> u8 {
        if self.pos() == 0 {
            0
        } else {
            self.buf[self.read_pos - 1]
        }
    }

    /// Returns the byte 'dist' bytes behind the encoder position (1-based).
    pub fn byte_back(&self, dist: usize) -> u8 {
        self.buf[self.read_pos - dist]
    }

    /// Returns the length of the match at the zero-based distance 'rep', up to
    /// 'limit' bytes, or zero if the distance reaches before the stream.
    pub fn rep_len(&self, rep: u32, limit: usize) -> usize {
        let dist = rep as usize + 1;
        if rep >= self.pos() || dist > self.read_pos {
            return 0;
        }
        self.match_len(self.read_pos - dist, self.read_pos, limit)
    }

    /// Return the size of the common prefix of the strings that start at 'a'
    /// and 'b', up to 'limit' bytes. The index 'a' must come before 'b'.
    fn match_len(&self, a: usize, b: usize, limit: usize) -> usize {
        debug_assert!(a < b, "Pointer b must come after pointer a");
        let limit = limit.min(self.write_pos - b);
        let mut len = 0;
        while len < limit && self.buf[a + len] == self.buf[b + len] {
            len += 1;
        }
        len
    }

    fn hash_at(&self, idx: usize) -> usize {
        let val = self.buf[idx] as u32
            | (self.buf[idx + 1] as u32) << 8
            | (self.buf[idx + 2] as u32) << 16;
        let val = val.wrapping_mul(0x797124e5);
        (val >> (32 - HASH_BITS)) as usize
    }

    /// Inserts the string at 'idx' into the hash chains.
    fn insert(&mut self, idx: usize) {
        let hash = self.hash_at(idx);
        self.chain[idx] = self.head[hash];
        self.head[hash] = self.base + idx as u32;
    }

    /// Inserts every position before 'end' that was not inserted yet.
    fn hash_until(&mut self, end: usize) {
        while self.hashed < end {
            if self.hashed + HASH_BYTES <= self.write_pos {
                self.insert(self.hashed);
            } else if !self.finishing {
                // Hashed once more input arrives.
                break;
            }
            self.hashed += 1;
        }
    }

    /// Return True if we can prove that the match at 'a' is not longer than
    /// 'best_len'.
    fn early_disqualify(&self, a: usize, b: usize, best_len: usize) -> bool {
        b + best_len < self.write_pos
            && self.buf[a + best_len] != self.buf[b + best_len]
    }

    /// Finds the longest match for the string that starts 'ahead' bytes after
    /// the encoder position. Returns the length and the distance (1-based) of
    /// the match, or None if there is no match of at least 'HASH_BYTES' bytes.
    /// The search stops after 'depth' candidates or at the first match of
    /// 'nice_len' bytes.
    pub fn find_match(
        &mut self,
        ahead: usize,
        nice_len: usize,
        depth: usize,
    ) -> Option<(usize, usize)> {
        let idx = self.read_pos + ahead;
        if idx + HASH_BYTES > self.write_pos {
            return None;
        }
        self.hash_until(idx);

        let limit = MATCH_LEN_MAX.min(self.write_pos - idx);
        let cur = self.base + idx as u32;
        let mut candidate = self.head[self.hash_at(idx)];
        let mut best: Option<(usize, usize)> = None;

        for _ in 0..depth {
            // Ignore empty cells, earlier streams and history that slid out.
            if candidate < self.base || candidate >= cur {
                break;
            }
            let dist = (cur - candidate) as usize;
            if dist > self.dict_size {
                break;
            }
            let at = (candidate - self.base) as usize;
            let best_len = best.map_or(0, |(len, _)| len);
            if !self.early_disqualify(at, idx, best_len) {
                let len = self.match_len(at, idx, limit);
                if len >= HASH_BYTES && len > best_len {
                    best = Some((len, dist));
                    if len >= nice_len {
                        break;
                    }
                }
            }
            candidate = self.chain[at];
        }
        best
    }

    /// Moves the encoder position 'len' bytes forward.
    pub fn advance(&mut self, len: usize) {
        debug_assert!(len <= self.avail());
        self.read_pos += len;
        self.hash_until(self.read_pos);
    }
}

#[cfg(test)]
fn window_with(input: &[u8]) -> LzWindow {
    let mut window = LzWindow::new(1 << 16);
    let mut rest = input;
    while !rest.is_empty() {
        let used = window.fill_window(rest);
        rest = &rest[used..];
    }
    window.set_finishing();
    window
}

#[test]
fn test_find_match() {
    let input = b"abcdefgh--abcdefgh--abcdXfgh";
    let mut window = window_with(input);
    window.advance(10);
    assert_eq!(window.find_match(0, 273, 16), Some((14, 10)));
    window.advance(10);
    assert_eq!(window.find_match(0, 273, 16), Some((4, 10)));
    assert_eq!(window.rep_len(9, 273), 4);
    assert_eq!(window.rep_len(19, 273), 4);
    // The distance reaches before the start of the stream.
    assert_eq!(window.rep_len(20, 273), 0);
    assert_eq!(window.prev_byte(), b'-');
}

#[test]
fn test_streams_do_not_share_history() {
    let mut window = window_with(b"hello world");
    window.advance(11);
    window.reset();

    let mut rest: &[u8] = b"hello world";
    while !rest.is_empty() {
        let used = window.fill_window(rest);
        rest = &rest[used..];
    }
    window.set_finishing();
    assert_eq!(window.pos(), 0);
    assert_eq!(window.prev_byte(), 0);
    assert_eq!(window.find_match(0, 273, 16), None);
}

#[test]
fn test_window_slides() {
    let dict_size = 1 << 12;
    let mut window = LzWindow::new(dict_size);
    let input: Vec<u8> = (0..300_000u32).map(|i| (i * 7 % 251) as u8).collect();
    let mut rest = &input[..];
    let mut encoded = 0;
    while !rest.is_empty() {
        let used = window.fill_window(rest);
        rest = &rest[used..];
        while window.has_enough_data() {
            assert_eq!(window.current_byte(), input[encoded]);
            if encoded == 200_000 {
                // The input repeats every 251 bytes.
                assert_eq!(window.find_match(0, 273, 4), Some((273, 251)));
            }
            window.advance(1);
            encoded += 1;
        }
    }
    assert!(window.buf.len() <= window.max_size);
    assert_eq!(window.pos() as usize, encoded);
}
