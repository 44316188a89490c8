//! Fixed-capacity cursors over caller-owned byte slices.
//!
//! A view is rebound ("wrapped") onto a new slice for every call, so the
//! contexts never copy their inputs or allocate output buffers. A view that is
//! not bound to any slice is closed, and every access on it fails.

use crate::error::LzmaError;
use std::io;

/// A sequential writer into a borrowed slice.
#[derive(Debug, Default)]
pub struct VolumeWriter<'a> {
    /// The bound slice, or None when the view is closed.
    cache: Option<&'a mut [u8]>,
    /// The next write position.
    seek: usize,
}

impl<'a> VolumeWriter<'a> {
    /// Creates a closed writer.
    pub fn new() -> Self {
        Self {
            cache: None,
            seek: 0,
        }
    }

    /// Creates a writer bound to 'buf' with the cursor at 'seek'.
    pub fn wrapped(buf: &'a mut [u8], seek: usize) -> Self {
        let mut writer = Self::new();
        writer.wrap(buf, seek);
        writer
    }

    /// Binds the view to 'buf' and moves the cursor to 'seek' (clamped to the
    /// length of the slice).
    pub fn wrap(&mut self, buf: &'a mut [u8], seek: usize) {
        self.seek = seek.min(buf.len());
        self.cache = Some(buf);
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, byte: u8) -> Result<(), LzmaError> {
        let seek = self.seek;
        match self.cache.as_deref_mut() {
            Some(buf) if seek < buf.len() => {
                buf[seek] = byte;
                self.seek += 1;
                Ok(())
            }
            _ => Err(LzmaError::BufferOverflow {
                needed: 1,
                remaining: 0,
            }),
        }
    }

    /// Writes all of 'bytes', or nothing if they do not fit.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), LzmaError> {
        let remaining = self.remaining();
        let seek = self.seek;
        match self.cache.as_deref_mut() {
            Some(buf) if bytes.len() <= remaining => {
                buf[seek..seek + bytes.len()].copy_from_slice(bytes);
                self.seek += bytes.len();
                Ok(())
            }
            _ => Err(LzmaError::BufferOverflow {
                needed: bytes.len(),
                remaining,
            }),
        }
    }

    /// Writes 'length' bytes of 'src' starting at 'offset'.
    pub fn write_at(
        &mut self,
        src: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<(), LzmaError> {
        crate::error::check_range(offset, length, src.len())?;
        self.write_all(&src[offset..offset + length])
    }

    pub fn write_u32_le(&mut self, val: u32) -> Result<(), LzmaError> {
        self.write_all(&val.to_le_bytes())
    }

    pub fn write_u64_le(&mut self, val: u64) -> Result<(), LzmaError> {
        self.write_all(&val.to_le_bytes())
    }

    /// Returns the cursor position, which is the number of bytes written
    /// since the start of the slice.
    pub fn size(&self) -> usize {
        self.seek
    }

    /// Returns the number of bytes that can still be written.
    pub fn remaining(&self) -> usize {
        self.capacity().map_or(0, |cap| cap - self.seek)
    }

    /// Returns the length of the bound slice, or None if the view is closed.
    pub fn capacity(&self) -> Option<usize> {
        self.cache.as_ref().map(|buf| buf.len())
    }

    pub fn is_closed(&self) -> bool {
        self.cache.is_none()
    }

    /// Rewinds the cursor to the start of the slice.
    pub fn reset(&mut self) {
        self.seek = 0;
    }

    /// Moves the cursor to 'position' (clamped to the capacity).
    pub fn reset_to(&mut self, position: usize) {
        self.seek = position.min(self.capacity().unwrap_or(0));
    }

    /// Releases the bound slice.
    pub fn close(&mut self) {
        self.cache = None;
        self.seek = 0;
    }
}

/// Writes are all-or-nothing: a buffer that is too small is reported as an
/// error instead of a short write.
impl<'a> io::Write for VolumeWriter<'a> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A sequential reader over a borrowed slice.
#[derive(Debug, Default, Clone)]
pub struct VolumeReader<'a> {
    /// The bound slice, or None when the view is closed.
    cache: Option<&'a [u8]>,
    /// The next read position.
    seek: usize,
}

impl<'a> VolumeReader<'a> {
    /// Creates a closed reader.
    pub fn new() -> Self {
        Self {
            cache: None,
            seek: 0,
        }
    }

    /// Creates a reader bound to 'buf' with the cursor at 'seek'.
    pub fn wrapped(buf: &'a [u8], seek: usize) -> Self {
        let mut reader = Self::new();
        reader.wrap(buf, seek);
        reader
    }

    /// Binds the view to 'buf' and moves the cursor to 'seek' (clamped to the
    /// length of the slice).
    pub fn wrap(&mut self, buf: &'a [u8], seek: usize) {
        self.seek = seek.min(buf.len());
        self.cache = Some(buf);
    }

    /// Reads the next byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, LzmaError> {
        match self.cache {
            Some(buf) if self.seek < buf.len() => {
                let byte = buf[self.seek];
                self.seek += 1;
                Ok(byte)
            }
            _ => Err(LzmaError::UnexpectedEof),
        }
    }

    /// Fills 'out' from the input, or consumes nothing if there are not enough
    /// bytes left.
    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<(), LzmaError> {
        match self.cache {
            Some(buf) if out.len() <= buf.len() - self.seek => {
                out.copy_from_slice(&buf[self.seek..self.seek + out.len()]);
                self.seek += out.len();
                Ok(())
            }
            _ => Err(LzmaError::UnexpectedEof),
        }
    }

    pub fn read_u32_le(&mut self) -> Result<u32, LzmaError> {
        let mut bytes = [0; 4];
        self.read_exact(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, LzmaError> {
        let mut bytes = [0; 8];
        self.read_exact(&mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Returns the cursor position, which is the number of bytes consumed
    /// since the start of the slice.
    pub fn size(&self) -> usize {
        self.seek
    }

    /// Returns the number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.capacity().map_or(0, |cap| cap - self.seek)
    }

    /// Returns the length of the bound slice, or None if the view is closed.
    pub fn capacity(&self) -> Option<usize> {
        self.cache.map(|buf| buf.len())
    }

    pub fn is_closed(&self) -> bool {
        self.cache.is_none()
    }

    /// Rewinds the cursor to the start of the slice.
    pub fn reset(&mut self) {
        self.seek = 0;
    }

    /// Moves the cursor to 'position' (clamped to the capacity).
    pub fn reset_to(&mut self, position: usize) {
        self.seek = position.min(self.capacity().unwrap_or(0));
    }

    /// Releases the bound slice.
    pub fn close(&mut self) {
        self.cache = None;
        self.seek = 0;
    }
}

impl<'a> io::Read for VolumeReader<'a> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let avail = io::BufRead::fill_buf(self)?;
        let len = avail.len().min(out.len());
        out[..len].copy_from_slice(&avail[..len]);
        self.seek += len;
        Ok(len)
    }
}

impl<'a> io::BufRead for VolumeReader<'a> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self.cache {
            Some(buf) => Ok(&buf[self.seek..]),
            None => Err(LzmaError::UnexpectedEof.into()),
        }
    }

    fn consume(&mut self, amt: usize) {
        self.seek = (self.seek + amt).min(self.capacity().unwrap_or(0));
    }
}

#[test]
fn test_writer_bounds() {
    let mut buf = [0u8; 4];
    let mut writer = VolumeWriter::wrapped(&mut buf, 1);
    assert_eq!(writer.size(), 1);
    assert_eq!(writer.remaining(), 3);
    writer.write_u8(7).unwrap();
    writer.write_all(&[8, 9]).unwrap();
    assert_eq!(writer.remaining(), 0);
    assert_eq!(
        writer.write_u8(1),
        Err(LzmaError::BufferOverflow {
            needed: 1,
            remaining: 0
        })
    );
    writer.reset_to(2);
    assert_eq!(
        writer.write_all(&[1, 2, 3]),
        Err(LzmaError::BufferOverflow {
            needed: 3,
            remaining: 2
        })
    );
    // A failed write leaves the buffer untouched.
    assert_eq!(writer.size(), 2);
    writer.close();
    assert!(writer.is_closed());
    assert_eq!(writer.capacity(), None);
    assert!(writer.write_u8(0).is_err());
    assert_eq!(buf, [0, 7, 8, 9]);
}

#[test]
fn test_reader_bounds() {
    let buf = [1u8, 2, 3, 4, 5, 6];
    let mut reader = VolumeReader::wrapped(&buf, 0);
    assert_eq!(reader.read_u8(), Ok(1));
    assert_eq!(reader.read_u32_le(), Ok(0x0504_0302));
    assert_eq!(reader.read_u32_le(), Err(LzmaError::UnexpectedEof));
    // The failed read did not move the cursor.
    assert_eq!(reader.size(), 5);
    assert_eq!(reader.read_u8(), Ok(6));
    assert_eq!(reader.read_u8(), Err(LzmaError::UnexpectedEof));
    reader.reset();
    assert_eq!(reader.remaining(), 6);
    reader.close();
    assert_eq!(reader.read_u8(), Err(LzmaError::UnexpectedEof));
}

#[test]
fn test_wrap_clamps_the_cursor() {
    let buf = [0u8; 3];
    let reader = VolumeReader::wrapped(&buf, 10);
    assert_eq!(reader.size(), 3);
    assert_eq!(reader.remaining(), 0);
}
