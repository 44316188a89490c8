//! Encoder configuration and the compression-level presets.

use crate::error::LzmaError;
use crate::header::{Properties, DICT_SIZE_MAX, DICT_SIZE_MIN};
use crate::models::MATCH_LEN_MAX;

/// The highest compression level.
pub const LEVEL_MAX: u32 = 9;

/// The level used by Options::default().
pub const LEVEL_DEFAULT: u32 = 6;

/// The shortest nice length that is accepted.
const NICE_LEN_MIN: usize = 8;

/// Dictionary size, nice length, search depth and lazy parsing, per level.
const PRESETS: [(u32, usize, usize, bool); 10] = [
    (1 << 18, 128, 4, false),
    (1 << 20, 128, 8, false),
    (1 << 21, 273, 24, false),
    (1 << 22, 273, 48, false),
    (1 << 22, 273, 64, true),
    (1 << 23, 273, 96, true),
    (1 << 23, 273, 128, true),
    (1 << 24, 273, 192, true),
    (1 << 25, 273, 256, true),
    (1 << 26, 273, 512, true),
];

/// Describes how a compression context encodes its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// The literal and position parameters written to the header.
    pub props: Properties,
    /// The size of the history the encoder may refer back to.
    pub dict_size: u32,
    /// Stop searching once a match of this length is found.
    pub nice_len: usize,
    /// The maximum number of match candidates examined per position.
    pub depth: usize,
    /// Check whether the next position has a longer match before taking one.
    pub lazy: bool,
    /// Write an unknown size to the header and terminate the payload with an
    /// end marker.
    pub end_marker: bool,
}

impl Options {
    /// Returns the preset for the compression level 'level' (0..=9).
    pub fn with_level(level: u32) -> Result<Self, LzmaError> {
        let (dict_size, nice_len, depth, lazy) = *PRESETS
            .get(level as usize)
            .ok_or(LzmaError::InvalidLevel(level))?;
        Ok(Self {
            props: Properties::default(),
            dict_size,
            nice_len,
            depth,
            lazy,
            end_marker: false,
        })
    }

    /// Checks that the options describe a valid encoder.
    pub fn validate(&self) -> Result<(), LzmaError> {
        Properties::new(self.props.lc, self.props.lp, self.props.pb)?;
        if !(DICT_SIZE_MIN..=DICT_SIZE_MAX).contains(&self.dict_size) {
            return Err(LzmaError::InvalidOptions(
                "dictionary size must be in 4096..=0x7ffffff0",
            ));
        }
        if !(NICE_LEN_MIN..=MATCH_LEN_MAX).contains(&self.nice_len) {
            return Err(LzmaError::InvalidOptions(
                "nice length must be in 8..=273",
            ));
        }
        if self.depth == 0 {
            return Err(LzmaError::InvalidOptions("depth must be at least 1"));
        }
        Ok(())
    }
}

impl Default for Options {
    fn default() -> Self {
        let (dict_size, nice_len, depth, lazy) =
            PRESETS[LEVEL_DEFAULT as usize];
        Self {
            props: Properties::default(),
            dict_size,
            nice_len,
            depth,
            lazy,
            end_marker: false,
        }
    }
}

#[test]
fn test_presets() {
    for level in 0..=LEVEL_MAX {
        let options = Options::with_level(level).unwrap();
        assert!(options.validate().is_ok());
        assert_eq!(options.props.to_byte(), 93);
    }
    assert_eq!(Options::with_level(0).unwrap().dict_size, 256 << 10);
    assert_eq!(Options::with_level(3).unwrap().dict_size, 4 << 20);
    assert_eq!(Options::with_level(9).unwrap().dict_size, 64 << 20);
    assert_eq!(Options::with_level(10), Err(LzmaError::InvalidLevel(10)));
    assert_eq!(Options::default(), Options::with_level(6).unwrap());
}

#[test]
fn test_validate() {
    let mut options = Options::default();
    options.dict_size = 100;
    assert!(options.validate().is_err());
    let mut options = Options::default();
    options.nice_len = 300;
    assert!(options.validate().is_err());
    let mut options = Options::default();
    options.props.lc = 9;
    assert!(options.validate().is_err());
    let mut options = Options::default();
    options.depth = 0;
    assert!(options.validate().is_err());
}
