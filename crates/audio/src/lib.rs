//! Parses MPEG Audio frame headers to compute the exact duration of a byte buffer.

pub mod frame;
pub mod parser;
mod tables;

pub use frame::{ChannelMode, FrameHeader, Layer, MpegVersion};
pub use parser::{parse_duration, parse_duration_default};
