//! This module contains the range coder and the LZMA symbol coders built on
//! top of it.

pub mod decoder;
pub mod encoder;
pub mod range;
