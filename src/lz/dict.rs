//! The decoder side of the LZ window: a circular history buffer that decoded
//! bytes are written into and flushed out of in bounded chunks.

use crate::error::LzmaError;

pub struct LzDict {
    /// The circular history buffer.
    buf: Vec<u8>,
    /// The first byte that was decoded but not yet flushed.
    start: usize,
    /// The next write position.
    pos: usize,
    /// The number of valid history bytes, saturating at the buffer size.
    full: usize,
    /// Decoding stops when 'pos' reaches this position.
    limit: usize,
    /// The part of the last match that did not fit under the limit.
    pending_len: usize,
    pending_dist: usize,
}

impl LzDict {
    /// Creates a window with 'size' bytes of history.
    pub fn new(size: usize) -> Self {
        let mut dict = Self {
            buf: vec![0; size],
            start: 0,
            pos: 0,
            full: 0,
            limit: 0,
            pending_len: 0,
            pending_dist: 0,
        };
        dict.reset();
        dict
    }

    /// Forgets the history.
    pub fn reset(&mut self) {
        self.start = 0;
        self.pos = 0;
        self.full = 0;
        self.limit = 0;
        self.pending_len = 0;
        self.pending_dist = 0;
        // The previous byte of a fresh stream reads as zero.
        if let Some(last) = self.buf.last_mut() {
            *last = 0;
        }
    }

    /// Forgets the history and changes the window to hold 'size' bytes.
    pub fn reset_with_size(&mut self, size: usize) {
        if size != self.buf.len() {
            self.buf = vec![0; size];
        }
        self.reset();
    }

    /// Returns the size of the history buffer.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Allows at most 'len' more bytes to be decoded before the next flush.
    pub fn set_limit(&mut self, len: usize) {
        if self.buf.len() - self.pos <= len {
            self.limit = self.buf.len();
        } else {
            self.limit = self.pos + len;
        }
    }

    #[inline]
    pub fn has_space(&self) -> bool {
        self.pos < self.limit
    }

    /// Returns true if a match was cut short by the limit.
    pub fn has_pending(&self) -> bool {
        self.pending_len > 0
    }

    /// Returns the write position, which wraps at the buffer size.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the byte at the zero-based distance 'dist' behind the write
    /// position.
    #[inline]
    pub fn get_byte(&self, dist: usize) -> u8 {
        let offset = if dist < self.pos {
            self.pos - dist - 1
        } else {
            self.pos + self.buf.len() - dist - 1
        };
        self.buf[offset]
    }

    #[inline]
    pub fn put_byte(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.pos += 1;
        if self.full < self.pos {
            self.full = self.pos;
        }
    }

    /// Copies 'len' bytes from the zero-based distance 'dist'. Bytes that do
    /// not fit under the limit are kept pending for the next call.
    pub fn repeat(&mut self, dist: usize, len: usize) -> Result<(), LzmaError> {
        if dist >= self.full {
            return Err(LzmaError::CorruptedPayload);
        }

        let left = (self.limit - self.pos).min(len);
        self.pending_len = len - left;
        self.pending_dist = dist;

        let size = self.buf.len();
        let mut back = if dist < self.pos {
            self.pos - dist - 1
        } else {
            self.pos + size - dist - 1
        };
        for _ in 0..left {
            self.buf[self.pos] = self.buf[back];
            self.pos += 1;
            back += 1;
            if back == size {
                back = 0;
            }
        }

        if self.full < self.pos {
            self.full = self.pos;
        }
        Ok(())
    }

    /// Continues a match that was cut short by the limit.
    pub fn repeat_pending(&mut self) -> Result<(), LzmaError> {
        if self.pending_len > 0 {
            self.repeat(self.pending_dist, self.pending_len)?;
        }
        Ok(())
    }

    /// Copies the bytes decoded since the last flush into 'out', and returns
    /// the number of bytes copied. 'out' must have room for them, which the
    /// limit guarantees.
    pub fn flush(&mut self, out: &mut [u8]) -> usize {
        let len = self.pos - self.start;
        out[..len].copy_from_slice(&self.buf[self.start..self.pos]);
        if self.pos == self.buf.len() {
            self.pos = 0;
        }
        self.start = self.pos;
        len
    }
}

#[test]
fn test_repeat_and_flush() {
    let mut dict = LzDict::new(16);
    let mut out = [0u8; 32];
    dict.set_limit(32);
    dict.put_byte(b'a');
    dict.put_byte(b'b');
    dict.repeat(1, 6).unwrap();
    assert_eq!(dict.flush(&mut out), 8);
    assert_eq!(&out[..8], b"abababab");
    assert_eq!(dict.get_byte(0), b'b');
    assert_eq!(dict.get_byte(7), b'a');
}

#[test]
fn test_limit_keeps_the_match_pending() {
    let mut dict = LzDict::new(16);
    let mut out = [0u8; 16];
    dict.set_limit(3);
    dict.put_byte(b'x');
    dict.repeat(0, 5).unwrap();
    assert!(!dict.has_space());
    assert!(dict.has_pending());
    assert_eq!(dict.flush(&mut out), 3);

    dict.set_limit(16);
    dict.repeat_pending().unwrap();
    assert!(!dict.has_pending());
    assert_eq!(dict.flush(&mut out), 3);
    assert_eq!(&out[..3], b"xxx");
}

#[test]
fn test_wrap_around() {
    let mut dict = LzDict::new(16);
    let mut out = [0u8; 16];
    let mut all = Vec::new();
    for round in 0..3u8 {
        dict.set_limit(16);
        while dict.has_space() {
            dict.put_byte(round);
        }
        let len = dict.flush(&mut out);
        all.extend_from_slice(&out[..len]);
    }
    assert_eq!(all.len(), 48);
    // The whole buffer is history now, so the full distance range is valid.
    assert_eq!(dict.get_byte(15), 2);
    dict.set_limit(4);
    assert!(dict.repeat(15, 4).is_ok());
    assert!(dict.repeat(16, 1).is_err());
}

#[test]
fn test_distance_beyond_history_is_corruption() {
    let mut dict = LzDict::new(4096);
    dict.set_limit(10);
    dict.put_byte(1);
    assert_eq!(dict.repeat(1, 2), Err(LzmaError::CorruptedPayload));
    let res = dict.repeat(u32::MAX as usize, 2);
    assert_eq!(res, Err(LzmaError::CorruptedPayload));
    dict.reset();
    assert_eq!(dict.get_byte(0), 0);
}
