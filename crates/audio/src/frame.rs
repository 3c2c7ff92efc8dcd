//! A single MPEG Audio frame header and its derived size/duration.

use crate::tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    L1,
    L2,
    L3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

impl ChannelMode {
    fn is_mono(self) -> bool {
        matches!(self, ChannelMode::Mono)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    pub bitrate_kbps: u32,
    pub sample_rate_hz: u32,
    pub padding: bool,
    pub channel_mode: ChannelMode,
}

impl FrameHeader {
    /// Frame size in bytes, per the canonical formulas.
    pub fn frame_size_bytes(&self) -> u32 {
        let padding = if self.padding { 1 } else { 0 };
        match self.layer {
            Layer::L1 => {
                (12 * self.bitrate_kbps * 1000 / self.sample_rate_hz + padding) * 4
            }
            Layer::L2 | Layer::L3 => {
                let k = if self.channel_mode.is_mono() { 72 } else { 144 };
                k * self.bitrate_kbps * 1000 / self.sample_rate_hz + padding
            }
        }
    }

    /// Frame duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        let samples = tables::samples_per_frame(self.version, self.layer) as f64;
        samples / self.sample_rate_hz as f64 * 1000.0
    }
}

/// Whether `bytes[offset..]` begins with an MPEG Audio frame sync: byte 0 is `0xFF` and the
/// top 3 bits of byte 1 are all set.
pub fn is_sync(bytes: &[u8], offset: usize) -> bool {
    bytes.len() >= offset + 2 && bytes[offset] == 0xFF && (bytes[offset + 1] & 0xE0) == 0xE0
}

/// Parses a 4-byte frame header at `offset`. Returns `None` if the bytes don't decode to a
/// valid, non-reserved header (callers resync by scanning forward).
pub fn parse_header(bytes: &[u8], offset: usize) -> Option<FrameHeader> {
    if bytes.len() < offset + 4 || !is_sync(bytes, offset) {
        return None;
    }
    let b1 = bytes[offset + 1];
    let b2 = bytes[offset + 2];
    let b3 = bytes[offset + 3];

    let version = match (b1 >> 3) & 0b11 {
        0b00 => MpegVersion::V25,
        0b10 => MpegVersion::V2,
        0b11 => MpegVersion::V1,
        _ => return None, // reserved
    };
    let layer = match (b1 >> 1) & 0b11 {
        0b01 => Layer::L3,
        0b10 => Layer::L2,
        0b11 => Layer::L1,
        _ => return None, // reserved
    };

    let bitrate_index = (b2 >> 4) & 0b1111;
    let bitrate_kbps = tables::bitrate_kbps(version, layer, bitrate_index)?;
    let sample_rate_index = (b2 >> 2) & 0b11;
    let sample_rate_hz = tables::sample_rate_hz(version, sample_rate_index)?;
    let padding = (b2 >> 1) & 0b1 == 1;

    let channel_mode = match (b3 >> 6) & 0b11 {
        0b00 => ChannelMode::Stereo,
        0b01 => ChannelMode::JointStereo,
        0b10 => ChannelMode::DualChannel,
        0b11 => ChannelMode::Mono,
        _ => unreachable!(),
    };

    Some(FrameHeader {
        version,
        layer,
        bitrate_kbps,
        sample_rate_hz,
        padding,
        channel_mode,
    })
}
