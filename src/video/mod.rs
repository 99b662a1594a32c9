//! Video module
//!
//! Frame decoding and seeking on top of FFmpeg.

mod decoder;

pub use decoder::{DecodeError, VideoDecoder};
