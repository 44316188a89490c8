//! The 13-byte container header that precedes every LZMA1 payload:
//!
//! ```text
//! +-------+-------------------+-----------------------------------+
//! | props | dict size (u32le) | uncompressed size (u64le)         |
//! +-------+-------------------+-----------------------------------+
//!   1 byte        4 bytes                   8 bytes
//! ```

use crate::error::LzmaError;
use crate::volume::{VolumeReader, VolumeWriter};

/// The size of the header in bytes.
pub const HEADER_SIZE: usize = 13;

/// The largest properties byte, encoding lc=8, lp=4, pb=4.
pub const PROPERTIES_MAX: u8 = (4 * 5 + 4) * 9 + 8;

/// The smallest dictionary the decoder allocates.
pub const DICT_SIZE_MIN: u32 = 4096;

/// The largest dictionary size accepted in a header.
pub const DICT_SIZE_MAX: u32 = i32::MAX as u32 & !15;

/// The largest uncompressed size accepted, in bytes.
pub const UNCOMPRESSED_SIZE_MAX: u64 = i32::MAX as u64 - 2;

/// The uncompressed size that marks a payload terminated by an end marker.
pub const UNKNOWN_SIZE: u64 = u64::MAX;

/// The literal and position parameters of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties {
    /// Number of high bits of the previous byte used as literal context.
    pub lc: u32,
    /// Number of low position bits used as literal context.
    pub lp: u32,
    /// Number of low position bits used as match context.
    pub pb: u32,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            lc: 3,
            lp: 0,
            pb: 2,
        }
    }
}

impl Properties {
    pub fn new(lc: u32, lp: u32, pb: u32) -> Result<Self, LzmaError> {
        if lc > 8 {
            return Err(LzmaError::InvalidOptions("lc must be in 0..=8"));
        }
        if lp > 4 {
            return Err(LzmaError::InvalidOptions("lp must be in 0..=4"));
        }
        if pb > 4 {
            return Err(LzmaError::InvalidOptions("pb must be in 0..=4"));
        }
        Ok(Self { lc, lp, pb })
    }

    /// Decodes a properties byte.
    pub fn from_byte(props: u8) -> Result<Self, LzmaError> {
        if props > PROPERTIES_MAX {
            return Err(LzmaError::InvalidPropertiesByte(props));
        }
        let props = props as u32;
        let pb = props / (9 * 5);
        let lp = (props % (9 * 5)) / 9;
        let lc = props % 9;
        // Unreachable for bytes in range, kept for hand-built headers.
        if lc > 8 || lp > 4 {
            return Err(LzmaError::InvalidPropertiesByte(props as u8));
        }
        Ok(Self { lc, lp, pb })
    }

    pub fn to_byte(self) -> u8 {
        ((self.pb * 5 + self.lp) * 9 + self.lc) as u8
    }
}

/// Rounds a dictionary size up to the minimum and to a multiple of 16.
/// 'size' must not exceed DICT_SIZE_MAX.
pub fn normalize_dict_size(size: u32) -> u32 {
    debug_assert!(size <= DICT_SIZE_MAX);
    (size.max(DICT_SIZE_MIN) + 15) & !15
}

/// A parsed and validated header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub props: Properties,
    pub dict_size: u32,
    /// The number of uncompressed bytes, or None if the payload ends with an
    /// end marker.
    pub uncompressed_size: Option<u64>,
}

impl Header {
    /// Serializes the header into 'out'.
    pub fn write(&self, out: &mut VolumeWriter) -> Result<(), LzmaError> {
        if out.remaining() < HEADER_SIZE {
            return Err(LzmaError::BufferOverflow {
                needed: HEADER_SIZE,
                remaining: out.remaining(),
            });
        }
        out.write_u8(self.props.to_byte())?;
        out.write_u32_le(self.dict_size)?;
        out.write_u64_le(self.uncompressed_size.unwrap_or(UNKNOWN_SIZE))
    }

    /// Parses and validates a header. The fields are checked in the order
    /// they appear, so the first bad field decides the error.
    pub fn read(input: &mut VolumeReader) -> Result<Self, LzmaError> {
        let props = Properties::from_byte(input.read_u8()?)?;

        let dict_size = input.read_u32_le()?;
        if dict_size > DICT_SIZE_MAX {
            return Err(LzmaError::UnsupportedDictionarySize(dict_size));
        }

        let uncompressed_size = match input.read_u64_le()? {
            UNKNOWN_SIZE => None,
            size if size > UNCOMPRESSED_SIZE_MAX => {
                return Err(LzmaError::PayloadTooLarge {
                    size,
                    limit: UNCOMPRESSED_SIZE_MAX,
                })
            }
            size => Some(size),
        };

        Ok(Self {
            props,
            dict_size,
            uncompressed_size,
        })
    }
}

#[test]
fn test_properties_byte() {
    assert_eq!(Properties::default().to_byte(), 93);
    assert_eq!(Properties::from_byte(93), Ok(Properties::default()));
    assert_eq!(Properties::new(8, 4, 4).unwrap().to_byte(), PROPERTIES_MAX);
    assert_eq!(Properties::from_byte(0), Properties::new(0, 0, 0));
    for byte in 0..=PROPERTIES_MAX {
        let props = Properties::from_byte(byte).unwrap();
        assert_eq!(props.to_byte(), byte);
    }
    assert_eq!(
        Properties::from_byte(225),
        Err(LzmaError::InvalidPropertiesByte(225))
    );
    assert!(Properties::new(9, 0, 0).is_err());
    assert!(Properties::new(0, 5, 0).is_err());
    assert!(Properties::new(0, 0, 5).is_err());
}

#[test]
fn test_normalize_dict_size() {
    assert_eq!(normalize_dict_size(0), 4096);
    assert_eq!(normalize_dict_size(44), 4096);
    assert_eq!(normalize_dict_size(4097), 4112);
    assert_eq!(normalize_dict_size(1 << 20), 1 << 20);
    assert_eq!(normalize_dict_size(DICT_SIZE_MAX), DICT_SIZE_MAX);
}

#[test]
fn test_header_layout() {
    let header = Header {
        props: Properties::default(),
        dict_size: 1 << 22,
        uncompressed_size: Some(44),
    };
    let mut buf = [0u8; HEADER_SIZE];
    header.write(&mut VolumeWriter::wrapped(&mut buf, 0)).unwrap();
    assert_eq!(buf, [93, 0, 0, 0x40, 0, 44, 0, 0, 0, 0, 0, 0, 0]);

    let mut reader = VolumeReader::wrapped(&buf, 0);
    assert_eq!(Header::read(&mut reader), Ok(header));
    assert_eq!(reader.size(), HEADER_SIZE);
}

#[test]
fn test_header_validation_order() {
    // A bad properties byte wins over a bad dictionary size.
    let buf = [225, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0, 0, 0, 0, 0];
    let res = Header::read(&mut VolumeReader::wrapped(&buf, 0));
    assert_eq!(res, Err(LzmaError::InvalidPropertiesByte(225)));

    let buf = [93, 0xf1, 0xff, 0xff, 0x7f, 0, 0, 0, 0, 0, 0, 0, 0];
    let res = Header::read(&mut VolumeReader::wrapped(&buf, 0));
    assert_eq!(res, Err(LzmaError::UnsupportedDictionarySize(0x7fff_fff1)));

    let buf = [93, 0, 0, 1, 0, 0xfe, 0xff, 0xff, 0x7f, 0, 0, 0, 0];
    let res = Header::read(&mut VolumeReader::wrapped(&buf, 0));
    assert!(matches!(res, Err(LzmaError::PayloadTooLarge { .. })));

    let buf = [93, 0, 0, 1];
    let res = Header::read(&mut VolumeReader::wrapped(&buf, 0));
    assert_eq!(res, Err(LzmaError::UnexpectedEof));
}
