//! The Lempel–Ziv windows: the encoder's sliding window with its match
//! finder, and the decoder's circular dictionary.

pub mod dict;
pub mod window;
