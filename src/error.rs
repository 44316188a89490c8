//! Errors reported by the compression and decompression contexts.

use std::io;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LzmaError {
    #[error("Invalid properties byte {0:#04x}")]
    InvalidPropertiesByte(u8),

    #[error("Unsupported dictionary size {0}")]
    UnsupportedDictionarySize(u32),

    #[error("Payload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Corrupted compressed payload")]
    CorruptedPayload,

    #[error("Buffer overflow: {needed} bytes needed, {remaining} remaining")]
    BufferOverflow { needed: usize, remaining: usize },

    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Invalid compression level {0}, expected 0..=9")]
    InvalidLevel(u32),

    #[error("Invalid options: {0}")]
    InvalidOptions(&'static str),

    #[error("Range {offset}+{length} is outside a buffer of {capacity} bytes")]
    InvalidRange {
        offset: usize,
        length: usize,
        capacity: usize,
    },

    #[error("Stream codec failure: {0}")]
    Stream(String),
}

impl From<LzmaError> for io::Error {
    fn from(err: LzmaError) -> Self {
        let kind = match err {
            LzmaError::BufferOverflow { .. } => io::ErrorKind::WriteZero,
            LzmaError::UnexpectedEof => io::ErrorKind::UnexpectedEof,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

/// Recovers the error that a buffer view packed into an io::Error, and
/// describes everything else as a stream failure.
impl From<io::Error> for LzmaError {
    fn from(err: io::Error) -> Self {
        if let Some(inner) =
            err.get_ref().and_then(|e| e.downcast_ref::<LzmaError>())
        {
            return inner.clone();
        }
        match err.kind() {
            io::ErrorKind::UnexpectedEof => LzmaError::UnexpectedEof,
            _ => LzmaError::Stream(err.to_string()),
        }
    }
}

/// Checks that 'offset..offset+length' lies inside a buffer of 'capacity'
/// bytes.
pub(crate) fn check_range(
    offset: usize,
    length: usize,
    capacity: usize,
) -> Result<(), LzmaError> {
    match offset.checked_add(length) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(LzmaError::InvalidRange {
            offset,
            length,
            capacity,
        }),
    }
}

#[test]
fn test_io_error_keeps_the_original_error() {
    let err = LzmaError::BufferOverflow {
        needed: 4,
        remaining: 1,
    };
    let io_err: io::Error = err.clone().into();
    assert_eq!(io_err.kind(), io::ErrorKind::WriteZero);
    assert_eq!(LzmaError::from(io_err), err);

    let foreign = io::Error::new(io::ErrorKind::Other, "disk on fire");
    assert!(matches!(LzmaError::from(foreign), LzmaError::Stream(_)));
}

#[test]
fn test_check_range() {
    assert!(check_range(0, 0, 0).is_ok());
    assert!(check_range(2, 3, 5).is_ok());
    assert!(check_range(3, 3, 5).is_err());
    assert!(check_range(usize::MAX, 2, 5).is_err());
}
